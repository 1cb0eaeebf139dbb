//! Upload batches.
//!
//! Files are checked locally first (extension and size), then sent to the
//! backend one at a time. Every file ends up as exactly one [`Document`],
//! processed or failed, so one bad file never hides the others.

use docpilot_config::UploadConfig;
use docpilot_core::backend::Backend;
use docpilot_core::document::Document;
use docpilot_core::error::Error;
use tracing::{debug, info, warn};

/// Reason recorded when the backend accepted a file but extracted nothing.
pub const NOT_PROCESSED_MESSAGE: &str = "Text extraction failed";

/// A local file waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercase extension with leading dot, if the name has one.
    fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        (!ext.is_empty()).then(|| format!(".{}", ext.to_ascii_lowercase()))
    }
}

/// Local acceptance rules applied before anything reaches the backend.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_file_size: u64,
    supported_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            supported_extensions: config
                .supported_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }
}

impl UploadPolicy {
    /// Check one file. The error string is what the user will see.
    pub fn check(&self, file: &UploadFile) -> Result<(), String> {
        let ext = file.extension();
        if !ext
            .as_ref()
            .is_some_and(|e| self.supported_extensions.contains(e))
        {
            return Err(format!(
                "Unsupported file type '{}'. Supported: {}",
                ext.unwrap_or_default(),
                self.supported_extensions.join(", ")
            ));
        }

        if file.size() > self.max_file_size {
            return Err(format!(
                "File too large: {} (max {})",
                megabytes(file.size()),
                megabytes(self.max_file_size)
            ));
        }

        Ok(())
    }
}

fn megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Outcome of one batch, in the order the files were given.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub documents: Vec<Document>,
}

impl UploadReport {
    pub fn processed(&self) -> usize {
        self.documents.iter().filter(|d| d.is_processed()).count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.processed()
    }
}

/// Upload files sequentially. Never fails as a whole.
pub async fn upload_batch(
    backend: &dyn Backend,
    policy: &UploadPolicy,
    files: Vec<UploadFile>,
) -> UploadReport {
    let mut report = UploadReport::default();

    for file in files {
        let document = match upload_one(backend, policy, file).await {
            Ok(document) => document,
            Err((document, err)) => {
                warn!(error = %err, "Upload failed");
                document
            }
        };
        report.documents.push(document);
    }

    info!(
        processed = report.processed(),
        failed = report.failed(),
        "Upload batch finished"
    );
    report
}

async fn upload_one(
    backend: &dyn Backend,
    policy: &UploadPolicy,
    file: UploadFile,
) -> Result<Document, (Document, Error)> {
    let size = file.size();
    let fail = |name: String, reason: String| {
        (
            Document::failed(&name, size, &reason),
            Error::UploadFailed {
                filename: name,
                reason,
            },
        )
    };

    if let Err(reason) = policy.check(&file) {
        return Err(fail(file.name, reason));
    }

    debug!(filename = %file.name, size, "Uploading");
    match backend.upload(&file.name, file.bytes).await {
        Ok(reply) if reply.processed => Ok(Document::processed(
            reply.filename,
            reply.content,
            reply.size_bytes,
        )),
        Ok(reply) => Err(fail(reply.filename, NOT_PROCESSED_MESSAGE.to_string())),
        Err(e) => Err(fail(file.name, e.user_message())),
    }
}
