//! Directory pools and their snapshots.
//!
//! The backend scans two server-side directories, "project" and
//! "reference". The client only ever sees whole snapshots of them; a refresh
//! replaces a snapshot, it never patches one.

use crate::version::{VersionClassifier, VersionInfo, VersionType};
use serde::{Deserialize, Serialize};

/// The two server-side document pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryPool {
    Project,
    Reference,
}

impl DirectoryPool {
    pub const ALL: [DirectoryPool; 2] = [DirectoryPool::Project, DirectoryPool::Reference];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Reference => "reference",
        }
    }
}

impl std::fmt::Display for DirectoryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file inside a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the pool root.
    pub path: String,

    /// `None` means unversioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_type: Option<VersionType>,

    /// Only meaningful when `version` is present.
    #[serde(default)]
    pub is_released: bool,
}

impl FileEntry {
    /// Build an entry, classifying its version from the path.
    pub fn classified(path: impl Into<String>) -> Self {
        let path = path.into();
        let info = VersionClassifier::new().classify(&path);
        Self::with_version(path, info)
    }

    pub fn with_version(path: impl Into<String>, info: VersionInfo) -> Self {
        Self {
            path: path.into(),
            is_released: info.version.is_some() && info.is_released,
            version: info.version,
            version_type: info.version_type,
        }
    }

    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }

    /// Released status with the "only when versioned" invariant applied.
    pub fn is_released(&self) -> bool {
        self.is_versioned() && self.is_released
    }

    pub fn is_draft(&self) -> bool {
        self.is_versioned() && !self.is_released
    }

    /// Badge text such as `V1.2` or `X0.5`; `None` for unversioned files.
    pub fn badge(&self) -> Option<String> {
        let version = self.version.as_deref()?;
        let tag = self
            .version_type
            .as_ref()
            .map(VersionType::as_str)
            .unwrap_or("V");
        Some(format!("{tag}{version}"))
    }
}

/// Released/draft counts for one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionStats {
    pub released: usize,
    pub drafts: usize,
}

impl VersionStats {
    pub fn has_versions(&self) -> bool {
        self.released + self.drafts > 0
    }
}

/// The full state of one directory pool at probe time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub file_count: usize,
    pub total_size_bytes: u64,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl DirectorySnapshot {
    pub fn new(files: Vec<FileEntry>, total_size_bytes: u64) -> Self {
        Self {
            file_count: files.len(),
            total_size_bytes,
            files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    pub fn version_stats(&self) -> VersionStats {
        self.files.iter().fold(VersionStats::default(), |mut acc, f| {
            if f.is_released() {
                acc.released += 1;
            } else if f.is_draft() {
                acc.drafts += 1;
            }
            acc
        })
    }
}
