//! One project's scan: mutate the shared declaration artifact, build the
//! scene, recognize call sites, restore the artifact, hand findings to the
//! sink.
//!
//! The declaration artifact is process-wide shared state that outlives any
//! session, so its temporary mutation is scoped: a [`RestoreGuard`] is
//! created before the first write and puts the original bytes back on every
//! exit path, error propagation and panics included. A scene-build failure
//! is surfaced to the caller only after restoration has run.

use crate::discovery::{self, Project};
use crate::model::ApiFinding;
use crate::recognizer::CallSiteRecognizer;
use crate::scene::{SceneBuildConfig, SceneProvider};
use crate::sink::{ProjectReportSink, ReportFormat, ResultSink};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

/// Immutable configuration for one scan session.
#[derive(Debug, Clone)]
pub struct ScanSessionConfig {
    pub project_root: PathBuf,
    pub sdk_root: PathBuf,
    pub output_root: PathBuf,
    pub format: ReportFormat,
    pub suppress_duplicates: bool,
    pub include_test_sources: bool,
    pub extra_lib: Option<PathBuf>,
    pub debug: bool,
}

impl ScanSessionConfig {
    pub fn new(project_root: impl Into<PathBuf>, sdk_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            output_root: project_root.clone(),
            project_root,
            sdk_root: sdk_root.into(),
            format: ReportFormat::default(),
            suppress_duplicates: false,
            include_test_sources: false,
            extra_lib: None,
            debug: false,
        }
    }
}

/// Puts the original content of a mutated file back when dropped.
///
/// [`restore`](Self::restore) is the preferred exit: it surfaces write
/// errors. The `Drop` impl is the backstop for panics and early returns and
/// can only log a failed restore.
struct RestoreGuard {
    path: PathBuf,
    original: Option<String>,
}

impl RestoreGuard {
    fn new(path: PathBuf, original: String) -> Self {
        Self {
            path,
            original: Some(original),
        }
    }

    fn restore(mut self) -> Result<()> {
        if let Some(original) = self.original.take() {
            std::fs::write(&self.path, original)
                .with_context(|| format!("restoring {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = std::fs::write(&self.path, original) {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to restore declaration artifact; operator intervention required"
                );
            }
        }
    }
}

/// Strips module-boundary keywords so the engine parses the declaration file
/// as a plain ambient script. Deliberately a blunt global replace, matching
/// what the engine expects to see in this mode.
fn strip_module_keywords(content: &str) -> String {
    content.replace("import", "").replace("export", "")
}

/// Scans exactly one project and contributes its findings to a sink.
pub struct ProjectScanSession {
    config: ScanSessionConfig,
    provider: Arc<dyn SceneProvider>,
    sink: Arc<dyn ResultSink>,
    decl_lock: Arc<AsyncMutex<()>>,
}

impl ProjectScanSession {
    pub fn new(
        config: ScanSessionConfig,
        provider: Arc<dyn SceneProvider>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            config,
            provider,
            sink,
            decl_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Shares the declaration-artifact lock with other sessions. The batch
    /// coordinator hands every session the same lock so only one of them
    /// holds the artifact mutated at a time.
    pub fn with_decl_lock(mut self, lock: Arc<AsyncMutex<()>>) -> Self {
        self.decl_lock = lock;
        self
    }

    /// Runs the mutate-scan-restore protocol and returns how many findings
    /// reached the sink.
    pub async fn run(&self) -> Result<usize> {
        if !self.config.project_root.is_dir() {
            bail!(
                "project directory {} does not exist",
                self.config.project_root.display()
            );
        }
        if let Some(lib) = &self.config.extra_lib {
            if lib.exists() {
                info!(lib = %lib.display(), "using extra library path");
            } else {
                warn!(lib = %lib.display(), "extra library path does not exist");
            }
        }

        let project = Project::new(&self.config.project_root);
        if !self.config.sdk_root.exists() {
            warn!(
                sdk = %self.config.sdk_root.display(),
                "SDK root not found, skipping {}",
                project.name()
            );
            return Ok(0);
        }
        let decl_path = discovery::declaration_artifact(&self.config.sdk_root);

        info!(
            project = %project.root().display(),
            sdk = %self.config.sdk_root.display(),
            "scanning app"
        );

        // Exclusive section: only one session may hold the declaration
        // artifact in its mutated state. The snapshot of the original
        // content must happen inside it too, or a session could capture
        // another session's mutated bytes as its "original" and restore
        // those.
        let _exclusive = self.decl_lock.lock().await;
        let original = match std::fs::read_to_string(&decl_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    path = %decl_path.display(),
                    error = %e,
                    "declaration artifact unreadable, skipping {}",
                    project.name()
                );
                return Ok(0);
            }
        };
        let guard = RestoreGuard::new(decl_path.clone(), original.clone());

        let outcome = async {
            tokio::fs::write(&decl_path, strip_module_keywords(&original))
                .await
                .with_context(|| format!("mutating {}", decl_path.display()))?;
            self.recognize_project(&project).await
        }
        .await;

        // Restoration has already run; the scan failure, if any, outranks a
        // restore failure.
        let findings = match (outcome, guard.restore()) {
            (Ok(findings), Ok(())) => findings,
            (Ok(_), Err(restore_err)) => return Err(restore_err),
            (Err(scan_err), Ok(())) => return Err(scan_err),
            (Err(scan_err), Err(restore_err)) => {
                error!(
                    error = %restore_err,
                    "restore failed after scan failure; operator intervention required"
                );
                return Err(scan_err);
            }
        };

        let count = findings.len();
        self.sink.add(findings);
        info!(project = %project.name(), count, "scan finished");
        Ok(count)
    }

    async fn recognize_project(&self, project: &Project) -> Result<Vec<ApiFinding>> {
        let scene_config = SceneBuildConfig {
            project_root: self.config.project_root.clone(),
            sdk_root: self.config.sdk_root.clone(),
            extra_lib: self.config.extra_lib.clone(),
        };
        let scene = self
            .provider
            .build_scene(&scene_config)
            .await
            .with_context(|| format!("building scene for {}", project.name()))?;

        let mut recognizer = CallSiteRecognizer::new();
        for source in project.app_sources(self.config.include_test_sources) {
            if self.config.debug {
                debug!(file = %source.display(), "recognizing");
            }
            recognizer.recognize(&scene, &source);
        }
        Ok(recognizer.into_findings())
    }
}

/// Scans one project into its own per-project artifact and returns the
/// artifact path.
pub async fn scan_project(
    config: ScanSessionConfig,
    provider: Arc<dyn SceneProvider>,
) -> Result<PathBuf> {
    let project = Project::new(&config.project_root);
    let sink = Arc::new(ProjectReportSink::new(
        &config.output_root,
        &project.name(),
        config.format,
        config.suppress_duplicates,
    ));
    let session = ProjectScanSession::new(config, provider, sink.clone());
    session.run().await?;
    sink.open();
    sink.flush().await?;
    Ok(sink.artifact_path().to_path_buf())
}
