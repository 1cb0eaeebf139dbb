//! `docpilot dirs`: project and reference directory listing.

use crate::render;
use docpilot_core::directory::DirectoryPool;
use docpilot_core::version::VersionClassifier;
use docpilot_session::SnapshotCache;

pub async fn run(refresh: bool, latest: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, backend) = super::connect()?;
    let cache = SnapshotCache::new();

    let errors = if refresh {
        println!("🔄 Rescanning directories...");
        cache.refresh_directories(&backend).await
    } else {
        cache.probe_directories(&backend).await
    };
    for e in &errors {
        eprintln!("  ⚠️  {}", e.user_message());
    }

    let classifier = VersionClassifier::new();
    for pool in DirectoryPool::ALL {
        let title = match pool {
            DirectoryPool::Project => "📁 Project",
            DirectoryPool::Reference => "📘 Reference",
        };
        let Some(snapshot) = cache.directory(pool).await else {
            println!("\n{title}: not available");
            continue;
        };

        println!("\n{title}: {}", render::directory_summary(&snapshot));

        let keep: Option<Vec<String>> = latest.then(|| {
            let paths: Vec<&str> = snapshot.files.iter().map(|f| f.path.as_str()).collect();
            classifier.select_latest_versions(&paths)
        });
        for entry in &snapshot.files {
            if keep.as_ref().is_some_and(|k| !k.contains(&entry.path)) {
                continue;
            }
            println!("{}", render::file_line(entry));
        }
    }

    Ok(())
}
