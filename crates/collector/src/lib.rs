//! apiscan-collector - System API Call-Site Collection Pipeline
//!
//! Walks pre-built program scenes (supplied by an external analysis engine),
//! resolves every invocation statement to a fully-qualified declaration,
//! deduplicates the results, and accumulates them across one or many
//! independently-scanned projects into a single report artifact.

pub mod batch;
pub mod discovery;
pub mod model;
pub mod recognizer;
pub mod scene;
pub mod session;
pub mod sink;

pub use batch::BatchScanCoordinator;
pub use model::{ApiFinding, RecordKey};
pub use recognizer::CallSiteRecognizer;
pub use scene::{
    JsonSceneProvider, Scene, SceneBuildConfig, SceneProvider, DEFAULT_CLASS_SENTINEL,
    DEFAULT_METHOD_SENTINEL, UNKNOWN_PACKAGE,
};
pub use session::{scan_project, ProjectScanSession, ScanSessionConfig};
pub use sink::{ProjectReportSink, ReportFormat, ResultSink, SharedReportSink};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
