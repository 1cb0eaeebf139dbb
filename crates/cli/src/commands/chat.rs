//! `docpilot chat`: single-message or interactive chat about documents.

use crate::render;
use docpilot_core::model::{BackendKind, ModelDescriptor, kind_selectable};
use docpilot_session::{
    ChatSession, SessionOptions, SnapshotCache, SubmitBlocked, SubmitOutcome, UploadFile,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

pub struct ChatArgs {
    pub message: Option<String>,
    pub files: Vec<PathBuf>,
    pub no_project: bool,
    pub no_reference: bool,
    pub backend: Option<String>,
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, backend) = super::connect()?;

    let mut options = SessionOptions::from(&config);
    options.include_project &= !args.no_project;
    options.include_reference &= !args.no_reference;
    if let Some(kind) = &args.backend {
        options.preferred_backend = Some(kind.parse::<BackendKind>()?);
    }

    let mut session = ChatSession::new(Arc::new(backend), Arc::new(SnapshotCache::new()), options);
    for e in session.sync().await {
        tracing::warn!(error = %e, "Startup probe failed");
    }

    if !args.files.is_empty() {
        upload_paths(&mut session, &args.files).await?;
    }

    match args.message {
        Some(message) => {
            session.set_input(message);
            eprint!("  Thinking...");
            let outcome = session.submit().await;
            eprint!("\r              \r");
            print_outcome(&session, &outcome);
            if matches!(outcome, SubmitOutcome::Answered) {
                Ok(())
            } else {
                Err(outcome_error(&outcome).into())
            }
        }
        None => interactive(&mut session).await,
    }
}

async fn upload_paths(
    session: &mut ChatSession,
    paths: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(UploadFile::new(name, bytes));
    }

    let start = session.documents().len();
    let report = session.upload_batch(files).await;
    for (offset, document) in report.documents.iter().enumerate() {
        println!("{}", render::document_line(start + offset + 1, document));
    }
    Ok(())
}

fn print_header(session: &ChatSession) {
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          docpilot  Interactive Chat          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Backend:    {}", session.backend().name());
    println!(
        "  Model:      {}",
        session
            .preference()
            .map(render::backend_label)
            .unwrap_or("none available")
    );
    print_sources(session);
    println!();
    println!("  Commands: /clear /refresh /local /cloud /project /reference");
    println!("            /files /remove <n>");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();
}

fn print_sources(session: &ChatSession) {
    let on_off = |on: bool| if on { "on" } else { "off" };
    println!(
        "  Sources:    {} uploads, project {}, reference {}",
        session.documents().processed().count(),
        on_off(session.include_project()),
        on_off(session.include_reference())
    );
}

fn print_outcome(session: &ChatSession, outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Answered | SubmitOutcome::Failed(_) => {
            if let Some(message) = session.conversation().last() {
                println!();
                for line in render::message_lines(message) {
                    println!("{line}");
                }
                println!();
            }
        }
        SubmitOutcome::Blocked(blocked) => {
            eprintln!("  [Blocked] {}", blocked_hint(*blocked));
        }
    }
}

fn blocked_hint(blocked: SubmitBlocked) -> String {
    match blocked {
        SubmitBlocked::NoContext => format!(
            "{blocked}. Upload a file or enable /project or /reference."
        ),
        SubmitBlocked::NoBackend => format!("{blocked}. Check `docpilot status`."),
        other => other.to_string(),
    }
}

/// Why `kind` cannot be picked, or `None` when one of its models is available.
fn backend_refusal(models: &[ModelDescriptor], kind: BackendKind) -> Option<String> {
    (!kind_selectable(models, kind))
        .then(|| format!("No available {} model.", render::backend_label(kind)))
}

fn outcome_error(outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::Answered => String::new(),
        SubmitOutcome::Failed(message) => message.clone(),
        SubmitOutcome::Blocked(blocked) => blocked.to_string(),
    }
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Exit,
    Clear,
    Refresh,
    Backend(BackendKind),
    ToggleProject,
    ToggleReference,
    Files,
    Remove(usize),
    Unknown(String),
    Message(String),
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let input = match line {
        "exit" | "quit" | "/exit" | "/quit" | ":q" => Input::Exit,
        "/clear" => Input::Clear,
        "/refresh" => Input::Refresh,
        "/local" => Input::Backend(BackendKind::Local),
        "/cloud" => Input::Backend(BackendKind::Cloud),
        "/project" => Input::ToggleProject,
        "/reference" => Input::ToggleReference,
        "/files" => Input::Files,
        _ => match line.strip_prefix("/remove") {
            Some(rest) => match rest.trim().parse::<usize>() {
                Ok(n) if n > 0 => Input::Remove(n),
                _ => Input::Unknown(line.to_string()),
            },
            None if line.starts_with('/') => Input::Unknown(line.to_string()),
            None => Input::Message(line.to_string()),
        },
    };
    Some(input)
}

async fn interactive(session: &mut ChatSession) -> Result<(), Box<dyn std::error::Error>> {
    print_header(session);

    let mut lines = BufReader::new(io::stdin()).lines();
    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            None => {}
            Some(Input::Exit) => break,
            Some(Input::Clear) => {
                session.clear();
                println!("  Conversation cleared.");
            }
            Some(Input::Refresh) => {
                for e in session.refresh_directories().await {
                    eprintln!("  ⚠️  {}", e.user_message());
                }
                if let Err(e) = session.sync_health().await {
                    eprintln!("  ⚠️  {}", e.user_message());
                }
                print_sources(session);
            }
            Some(Input::Backend(kind)) => {
                match backend_refusal(&session.cache().models().await, kind) {
                    Some(refusal) => eprintln!("  {refusal}"),
                    None => {
                        session.set_preference(kind);
                        println!("  Using {}", render::backend_label(kind));
                    }
                }
            }
            Some(Input::ToggleProject) => {
                session.set_include_project(!session.include_project());
                print_sources(session);
            }
            Some(Input::ToggleReference) => {
                session.set_include_reference(!session.include_reference());
                print_sources(session);
            }
            Some(Input::Files) => {
                if session.documents().is_empty() {
                    println!("  No uploads.");
                }
                for (i, document) in session.documents().iter().enumerate() {
                    println!("{}", render::document_line(i + 1, document));
                }
            }
            Some(Input::Remove(n)) => {
                let id = session.documents().as_slice().get(n - 1).map(|d| d.id.clone());
                match id.and_then(|id| session.remove_document(&id)) {
                    Some(removed) => println!("  Removed {}", removed.name),
                    None => eprintln!("  No upload #{n}"),
                }
            }
            Some(Input::Unknown(command)) => eprintln!("  Unknown command: {command}"),
            Some(Input::Message(text)) => {
                session.set_input(text);
                eprint!("  ...");
                let outcome = session.submit().await;
                eprint!("\r     \r");
                print_outcome(session, &outcome);
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
