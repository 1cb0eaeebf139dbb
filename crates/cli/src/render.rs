//! Terminal rendering helpers shared by the commands.

use docpilot_core::directory::{DirectorySnapshot, FileEntry};
use docpilot_core::document::Document;
use docpilot_core::message::{ConversationMessage, Role};
use docpilot_core::model::{BackendKind, HealthStatus, ModelDescriptor};

/// `512 B`, `1.5 KB`, `2.0 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Model size in decimal gigabytes, e.g. `2.0 GB`.
pub fn format_model_size(bytes: u64) -> String {
    format!("{:.1} GB", bytes as f64 / 1e9)
}

pub fn backend_label(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Local => "Local (Ollama)",
        BackendKind::Cloud => "Cloud (Claude)",
    }
}

fn check(on: bool) -> &'static str {
    if on { "✅" } else { "❌" }
}

pub fn health_lines(health: &HealthStatus) -> Vec<String> {
    let mut lines = vec![
        format!(
            "  Backend:   {}",
            if health.is_healthy() { "healthy" } else { "error" }
        ),
        format!("  Local:     {}", check(health.local_available)),
        format!("  Cloud:     {}", check(health.cloud_available)),
        format!("  Default:   {}", backend_label(health.default_backend)),
    ];
    if let Some(message) = &health.message {
        lines.push(format!("  Note:      {message}"));
    }
    lines
}

pub fn model_line(model: &ModelDescriptor) -> String {
    let size = model
        .size_bytes
        .map(|s| format!(" ({})", format_model_size(s)))
        .unwrap_or_default();
    format!(
        "  {} [{}] {}{}",
        check(model.available),
        model.kind,
        model.name,
        size
    )
}

/// One directory entry, with its version badge when versioned.
pub fn file_line(entry: &FileEntry) -> String {
    match entry.badge() {
        Some(badge) if entry.is_released() => format!("    {}  [{badge}]", entry.path),
        Some(badge) => format!("    {}  [{badge} draft]", entry.path),
        None => format!("    {}", entry.path),
    }
}

pub fn directory_summary(snapshot: &DirectorySnapshot) -> String {
    let mut summary = format!(
        "{} files, {}",
        snapshot.file_count,
        format_file_size(snapshot.total_size_bytes)
    );
    let stats = snapshot.version_stats();
    if stats.has_versions() {
        summary.push_str(&format!(
            ", {} released, {} drafts",
            stats.released, stats.drafts
        ));
    }
    summary
}

pub fn document_line(index: usize, document: &Document) -> String {
    let size = format_file_size(document.size_bytes);
    match &document.error {
        Some(error) if !document.is_processed() => {
            format!("  {index}. ❌ {} ({size}): {error}", document.name)
        }
        _ => format!("  {index}. 📄 {} ({size})", document.name),
    }
}

/// Render one conversation entry as terminal lines.
pub fn message_lines(message: &ConversationMessage) -> Vec<String> {
    let prefix = match (message.role, message.is_error) {
        (Role::User, _) => "You",
        (Role::Assistant, true) => "Error",
        (Role::Assistant, false) => "Assistant",
    };

    let mut lines: Vec<String> = message
        .content
        .lines()
        .map(|line| format!("  {prefix} > {line}"))
        .collect();

    if let (Some(model), Some(kind)) = (&message.model, message.llm_type) {
        let mut footer = format!("  [{model} | {kind}");
        if let Some(usage) = message.usage {
            footer.push_str(&format!(
                " | {} in / {} out",
                usage.input_tokens, usage.output_tokens
            ));
        }
        footer.push(']');
        lines.push(footer);
    }

    for citation in &message.citations {
        lines.push(format!("  Source: {}", citation.filename));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpilot_core::message::{Citation, Usage};

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn model_size_in_gigabytes() {
        assert_eq!(format_model_size(2_019_393_189), "2.0 GB");
    }

    #[test]
    fn badges_mark_drafts() {
        assert_eq!(
            file_line(&FileEntry::classified("Lastenheft_V2.pdf")),
            "    Lastenheft_V2.pdf  [V2]"
        );
        assert_eq!(
            file_line(&FileEntry::classified("Pflichtenheft_X3.docx")),
            "    Pflichtenheft_X3.docx  [X3 draft]"
        );
        assert_eq!(file_line(&FileEntry::classified("plain.txt")), "    plain.txt");
    }

    #[test]
    fn summary_includes_version_stats() {
        let snapshot = DirectorySnapshot::new(
            vec![
                FileEntry::classified("a_V1.pdf"),
                FileEntry::classified("b_X2.pdf"),
                FileEntry::classified("c.txt"),
            ],
            2048,
        );
        assert_eq!(
            directory_summary(&snapshot),
            "3 files, 2.0 KB, 1 released, 1 drafts"
        );
        assert_eq!(
            directory_summary(&DirectorySnapshot::default()),
            "0 files, 0 B"
        );
    }

    #[test]
    fn assistant_message_has_footer_and_sources() {
        let message = ConversationMessage::assistant("Zeile 1\nZeile 2")
            .with_model("llama3.2", BackendKind::Local)
            .with_usage(Some(Usage {
                input_tokens: 40,
                output_tokens: 8,
            }))
            .with_citations(vec![Citation {
                filename: "a.txt".into(),
                content: "X".into(),
            }]);
        assert_eq!(
            message_lines(&message),
            vec![
                "  Assistant > Zeile 1",
                "  Assistant > Zeile 2",
                "  [llama3.2 | local | 40 in / 8 out]",
                "  Source: a.txt",
            ]
        );
    }

    #[test]
    fn error_message_is_marked() {
        let message = ConversationMessage::error("Error while processing: boom");
        assert_eq!(
            message_lines(&message),
            vec!["  Error > Error while processing: boom"]
        );
    }

    #[test]
    fn failed_document_shows_reason() {
        let doc = Document::failed("b.pdf", 2048, "PDF extraction failed");
        assert_eq!(
            document_line(2, &doc),
            "  2. ❌ b.pdf (2.0 KB): PDF extraction failed"
        );
    }
}
