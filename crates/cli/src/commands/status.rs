//! `docpilot status`: backend health and model inventory.

use crate::render;
use docpilot_core::model::{BackendKind, models_of_kind};
use docpilot_session::SnapshotCache;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (_, backend) = super::connect()?;
    let cache = SnapshotCache::new();

    println!("📚 docpilot Status");
    println!("==================");
    println!("  API:       {}", backend.base_url());

    if let Err(e) = cache.probe_health(&backend).await {
        tracing::debug!(error = %e, "Health probe failed");
    }
    for line in render::health_lines(&*cache.health().await) {
        println!("{line}");
    }

    let models = match cache.probe_models(&backend).await {
        Ok(models) => models,
        Err(e) => {
            println!("\n  ⚠️  Models unavailable: {}", e.user_message());
            return Ok(());
        }
    };

    for kind in [BackendKind::Local, BackendKind::Cloud] {
        println!("\n  {}:", render::backend_label(kind));
        let mut any = false;
        for model in models_of_kind(&models, kind) {
            println!("{}", render::model_line(model));
            any = true;
        }
        if !any {
            println!("    (none)");
        }
    }

    Ok(())
}
