//! Result sinks: stateful accumulators that persist findings.
//!
//! A sink buffers findings from one or more scan sessions and writes the
//! report artifact on `flush`. `add` never reorders what a caller hands in
//! and never interleaves one caller's batch with another's; `flush` is the
//! only operation that performs blocking I/O and is idempotent; `close`
//! resets open-mode state so the same artifact can be reopened by a later
//! writer incarnation (the batch coordinator closes its shared sink right
//! after construction for exactly that reason).

use crate::model::{ApiFinding, RecordKey};
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Prepares the artifact for writing. Idempotent when nothing has been
    /// added yet.
    fn open(&self);

    /// Appends records in the order presented. Safe to call from several
    /// sessions; each call's internal order is preserved as a block.
    fn add(&self, findings: Vec<ApiFinding>);

    /// Writes the artifact durably. A second flush with no intervening add
    /// is a no-op.
    async fn flush(&self) -> Result<()>;

    /// Releases open-mode state without touching buffered rows.
    fn close(&self);
}

/// Buffering and duplicate suppression shared by both sink variants.
struct ReportBuffer {
    rows: Vec<ApiFinding>,
    seen: HashSet<RecordKey>,
    opened: bool,
    dirty: bool,
}

impl ReportBuffer {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            seen: HashSet::new(),
            opened: false,
            // An empty report is still an unwritten artifact: the first
            // flush must produce it even when nothing was ever added.
            dirty: true,
        }
    }
}

struct SinkCore {
    path: PathBuf,
    format: ReportFormat,
    suppress_duplicates: bool,
    buffer: Mutex<ReportBuffer>,
}

impl SinkCore {
    fn new(path: PathBuf, format: ReportFormat, suppress_duplicates: bool) -> Self {
        Self {
            path,
            format,
            suppress_duplicates,
            buffer: Mutex::new(ReportBuffer::new()),
        }
    }

    fn open(&self) {
        self.buffer.lock().opened = true;
    }

    fn add(&self, findings: Vec<ApiFinding>) {
        let mut buffer = self.buffer.lock();
        for finding in findings {
            if self.suppress_duplicates {
                let key = finding.record_key();
                if !buffer.seen.insert(key) {
                    continue;
                }
            }
            buffer.rows.push(finding);
            buffer.dirty = true;
        }
    }

    async fn flush(&self) -> Result<()> {
        let content = {
            let mut buffer = self.buffer.lock();
            if !buffer.dirty {
                return Ok(());
            }
            if !buffer.opened {
                // Open is idempotent when unused before the first add; a
                // flush on a never-opened sink is legal in single-writer
                // mode.
                debug!(path = %self.path.display(), "flushing sink without explicit open");
            }
            let content = render(self.format, &buffer.rows)?;
            // Cleared under the same lock that snapshots the rows: an add
            // racing this flush keeps its own dirty bit.
            buffer.dirty = false;
            content
        };
        if let Err(e) = self.write_artifact(content).await {
            // Rows are still buffered; mark them pending for a retry.
            self.buffer.lock().dirty = true;
            return Err(e);
        }
        debug!(path = %self.path.display(), "report flushed");
        Ok(())
    }

    async fn write_artifact(&self, content: String) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("writing report to {}", self.path.display()))?;
        Ok(())
    }

    fn close(&self) {
        self.buffer.lock().opened = false;
    }

    fn row_count(&self) -> usize {
        self.buffer.lock().rows.len()
    }
}

/// One artifact per project. Duplicate suppression, when enabled, applies to
/// this project's findings only.
pub struct ProjectReportSink {
    core: SinkCore,
}

impl ProjectReportSink {
    pub fn new(
        output_root: &Path,
        project_name: &str,
        format: ReportFormat,
        suppress_duplicates: bool,
    ) -> Self {
        let path = output_root.join(format!("{}_api.{}", project_name, format.extension()));
        Self {
            core: SinkCore::new(path, format, suppress_duplicates),
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.core.path
    }

    pub fn row_count(&self) -> usize {
        self.core.row_count()
    }
}

#[async_trait]
impl ResultSink for ProjectReportSink {
    fn open(&self) {
        self.core.open();
    }

    fn add(&self, findings: Vec<ApiFinding>) {
        self.core.add(findings);
    }

    async fn flush(&self) -> Result<()> {
        self.core.flush().await
    }

    fn close(&self) {
        self.core.close();
    }
}

/// One artifact aggregating every project of a batch run.
///
/// The duplicate-suppression set is owned by the sink, not by contributing
/// sessions, so with suppression enabled a finding that two projects both
/// produce lands in the artifact once.
pub struct SharedReportSink {
    core: SinkCore,
}

impl SharedReportSink {
    pub const ARTIFACT_STEM: &'static str = "collected_api";

    pub fn new(output_root: &Path, format: ReportFormat, suppress_duplicates: bool) -> Self {
        let path = output_root.join(format!("{}.{}", Self::ARTIFACT_STEM, format.extension()));
        Self {
            core: SinkCore::new(path, format, suppress_duplicates),
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.core.path
    }

    pub fn row_count(&self) -> usize {
        self.core.row_count()
    }
}

#[async_trait]
impl ResultSink for SharedReportSink {
    fn open(&self) {
        self.core.open();
    }

    fn add(&self, findings: Vec<ApiFinding>) {
        self.core.add(findings);
    }

    async fn flush(&self) -> Result<()> {
        self.core.flush().await
    }

    fn close(&self) {
        self.core.close();
    }
}

const CSV_COLUMNS: [&str; 13] = [
    "decl_file_name",
    "package_name",
    "type_name",
    "property_name",
    "api_raw_text",
    "source_file_name",
    "position",
    "deprecated_since",
    "qualified_name",
    "use_instead",
    "component_name",
    "api_type",
    "decl_path",
];

fn render(format: ReportFormat, rows: &[ApiFinding]) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        ReportFormat::Csv => Ok(render_csv(rows)),
    }
}

fn render_csv(rows: &[ApiFinding]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_COLUMNS.join(","));
    out.push('\n');
    for row in rows {
        let fields = [
            row.decl_file_name.as_str(),
            row.package_name.as_str(),
            row.type_name.as_str(),
            row.property_name.as_str(),
            row.api_raw_text.as_str(),
            row.source_file_name.as_str(),
            row.position.as_str(),
            row.deprecated_since.as_str(),
            row.qualified_name.as_str(),
            row.use_instead.as_str(),
            row.component_name.as_str(),
            row.api_type.as_str(),
            row.decl_path.as_str(),
        ];
        let escaped: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
