//! Process-wide snapshots of backend state.
//!
//! Health, the model inventory and the directory view are each held behind
//! an `Arc` and replaced wholesale on every probe, never merged. Both
//! directory pools live in one [`DirectoryView`] that is swapped in a single
//! write, so a reader sees either the old pair or the new pair. A turn that
//! cloned an `Arc` keeps seeing that snapshot even if a refresh lands
//! mid-turn.
//!
//! Probe failures degrade the cached value instead of keeping stale data:
//! health becomes "not reachable", models become empty, a directory becomes
//! absent.

use docpilot_core::backend::Backend;
use docpilot_core::directory::{DirectoryPool, DirectorySnapshot};
use docpilot_core::error::{BackendError, Error, ProbeKind};
use docpilot_core::model::{HealthStatus, ModelDescriptor};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Status stored when the health probe fails.
pub const UNREACHABLE_MESSAGE: &str = "Backend not reachable";

/// Cached backend state shared by every session in the process.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    health: RwLock<Arc<HealthStatus>>,
    models: RwLock<Arc<Vec<ModelDescriptor>>>,
    directories: RwLock<Arc<DirectoryView>>,
}

/// Both directory snapshots, captured together.
#[derive(Debug, Clone, Default)]
pub struct DirectoryView {
    pub project: Option<Arc<DirectorySnapshot>>,
    pub reference: Option<Arc<DirectorySnapshot>>,
}

impl DirectoryView {
    pub fn get(&self, pool: DirectoryPool) -> Option<&DirectorySnapshot> {
        match pool {
            DirectoryPool::Project => self.project.as_deref(),
            DirectoryPool::Reference => self.reference.as_deref(),
        }
    }
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn health(&self) -> Arc<HealthStatus> {
        self.health.read().await.clone()
    }

    pub async fn models(&self) -> Arc<Vec<ModelDescriptor>> {
        self.models.read().await.clone()
    }

    pub async fn directory(&self, pool: DirectoryPool) -> Option<Arc<DirectorySnapshot>> {
        let view = self.directories().await;
        match pool {
            DirectoryPool::Project => view.project.clone(),
            DirectoryPool::Reference => view.reference.clone(),
        }
    }

    /// Both pools as of the same probe.
    pub async fn directories(&self) -> Arc<DirectoryView> {
        self.directories.read().await.clone()
    }

    pub async fn replace_health(&self, health: HealthStatus) {
        *self.health.write().await = Arc::new(health);
    }

    pub async fn replace_models(&self, models: Vec<ModelDescriptor>) {
        *self.models.write().await = Arc::new(models);
    }

    pub async fn replace_directories(&self, view: DirectoryView) {
        *self.directories.write().await = Arc::new(view);
    }

    /// Probe health and store the result.
    ///
    /// On failure the stored status becomes [`HealthStatus::unreachable`] and
    /// the probe error is returned for reporting.
    pub async fn probe_health(&self, backend: &dyn Backend) -> Result<Arc<HealthStatus>, Error> {
        match backend.health().await {
            Ok(health) => {
                debug!(
                    local = health.local_available,
                    cloud = health.cloud_available,
                    default_backend = %health.default_backend,
                    "Health probed"
                );
                self.replace_health(health).await;
                Ok(self.health().await)
            }
            Err(source) => {
                warn!(error = %source, "Health probe failed");
                self.replace_health(HealthStatus::unreachable(UNREACHABLE_MESSAGE))
                    .await;
                Err(Error::ProbeFailed {
                    probe: ProbeKind::Health,
                    source,
                })
            }
        }
    }

    /// Fetch the model inventory. Failure leaves an empty list.
    pub async fn probe_models(&self, backend: &dyn Backend) -> Result<Arc<Vec<ModelDescriptor>>, Error> {
        match backend.models().await {
            Ok(models) => {
                debug!(count = models.len(), "Model inventory fetched");
                self.replace_models(models).await;
                Ok(self.models().await)
            }
            Err(source) => {
                warn!(error = %source, "Model inventory fetch failed");
                self.replace_models(Vec::new()).await;
                Err(Error::ProbeFailed {
                    probe: ProbeKind::Models,
                    source,
                })
            }
        }
    }

    /// Fetch both directory pools, then publish them together. A failed
    /// pool becomes absent; the other one is still updated. Returns one
    /// error per failed pool.
    pub async fn probe_directories(&self, backend: &dyn Backend) -> Vec<Error> {
        let (project, reference) = tokio::join!(
            backend.directory(DirectoryPool::Project),
            backend.directory(DirectoryPool::Reference),
        );

        let mut errors = Vec::new();
        let view = DirectoryView {
            project: keep_pool(DirectoryPool::Project, project, &mut errors),
            reference: keep_pool(DirectoryPool::Reference, reference, &mut errors),
        };

        self.replace_directories(view).await;
        errors
    }

    /// Ask the backend to rescan its directories, then refetch both pools.
    ///
    /// When the rescan request itself fails the cached snapshots are kept
    /// and nothing is refetched.
    pub async fn refresh_directories(&self, backend: &dyn Backend) -> Vec<Error> {
        if let Err(source) = backend.refresh_directories().await {
            warn!(error = %source, "Directory refresh failed");
            return vec![Error::ProbeFailed {
                probe: ProbeKind::Refresh,
                source,
            }];
        }
        self.probe_directories(backend).await
    }
}

fn keep_pool(
    pool: DirectoryPool,
    result: Result<DirectorySnapshot, BackendError>,
    errors: &mut Vec<Error>,
) -> Option<Arc<DirectorySnapshot>> {
    match result {
        Ok(snapshot) => {
            debug!(pool = %pool, files = snapshot.file_count, "Directory fetched");
            Some(Arc::new(snapshot))
        }
        Err(source) => {
            warn!(pool = %pool, error = %source, "Directory fetch failed");
            errors.push(Error::ProbeFailed {
                probe: ProbeKind::Directory(pool),
                source,
            });
            None
        }
    }
}
