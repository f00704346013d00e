//! Batch scanning: one session per discovered app project, all feeding a
//! single shared report artifact.
//!
//! The ordering contract is strict: the shared sink is closed right after
//! construction (clearing any stale open-mode state), every session is
//! launched and then *joined*, and only after the last session has completed
//! is the sink opened and flushed. Finalizing earlier would truncate the
//! artifact. One project failing does not stop the others or the final
//! flush.

use crate::discovery::{self, Project};
use crate::scene::SceneProvider;
use crate::session::{ProjectScanSession, ScanSessionConfig};
use crate::sink::{ResultSink, SharedReportSink};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

pub struct BatchScanCoordinator {
    app_parent: PathBuf,
    template: ScanSessionConfig,
    provider: Arc<dyn SceneProvider>,
}

impl BatchScanCoordinator {
    /// `template.project_root` is replaced per discovered app; every other
    /// field applies to all sessions.
    pub fn new(
        app_parent: impl Into<PathBuf>,
        template: ScanSessionConfig,
        provider: Arc<dyn SceneProvider>,
    ) -> Self {
        Self {
            app_parent: app_parent.into(),
            template,
            provider,
        }
    }

    /// Scans every app under the parent directory. Returns the shared
    /// artifact path, or `None` when no app was found (no output produced).
    pub async fn run(&self) -> Result<Option<PathBuf>> {
        let apps = discovery::list_app_dirs(&self.app_parent);
        if apps.is_empty() {
            info!(parent = %self.app_parent.display(), "no app project found");
            return Ok(None);
        }

        let sink = Arc::new(SharedReportSink::new(
            &self.template.output_root,
            self.template.format,
            self.template.suppress_duplicates,
        ));
        // Reset stale open-mode state before any session contributes.
        sink.close();

        // All sessions share one lock on the declaration artifact.
        let decl_lock = Arc::new(AsyncMutex::new(()));

        let mut handles = Vec::with_capacity(apps.len());
        for app in apps {
            let name = Project::new(&app).name();
            let mut config = self.template.clone();
            config.project_root = app;
            let session = ProjectScanSession::new(
                config,
                self.provider.clone(),
                sink.clone() as Arc<dyn ResultSink>,
            )
            .with_decl_lock(decl_lock.clone());
            handles.push(tokio::spawn(async move { (name, session.run().await) }));
        }

        // Barrier: every session must complete before the sink is finalized.
        let mut total = 0usize;
        let mut failed = 0usize;
        for handle in handles {
            match handle.await {
                Ok((name, Ok(count))) => {
                    info!(project = %name, count, "session completed");
                    total += count;
                }
                Ok((name, Err(e))) => {
                    failed += 1;
                    warn!(project = %name, error = %e, "session failed");
                }
                Err(e) => {
                    failed += 1;
                    warn!(error = %e, "session task aborted");
                }
            }
        }

        sink.open();
        sink.flush().await?;
        info!(
            total,
            failed,
            artifact = %sink.artifact_path().display(),
            "batch scan finalized"
        );
        Ok(Some(sink.artifact_path().to_path_buf()))
    }
}
