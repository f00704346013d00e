//! Single-project scan: one session, one per-project artifact.

use super::FormatArg;
use anyhow::Result;
use apiscan_collector::{scan_project, JsonSceneProvider, ScanSessionConfig};
use clap::Args;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Project root to scan.
    pub project: PathBuf,

    /// SDK root containing the platform declaration files.
    #[arg(long)]
    pub sdk: PathBuf,

    /// Where to write the report (defaults to the project root).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,

    /// Suppress duplicate findings in the report.
    #[arg(long)]
    pub no_repeat: bool,

    /// Also scan test source trees.
    #[arg(long)]
    pub include_tests: bool,

    /// Extra library path handed to the analysis engine.
    #[arg(long)]
    pub lib: Option<PathBuf>,
}

pub async fn execute(args: ScanArgs, debug: bool) -> Result<()> {
    let mut config = ScanSessionConfig::new(&args.project, &args.sdk);
    config.output_root = args.output.unwrap_or_else(|| args.project.clone());
    config.format = args.format.into();
    config.suppress_duplicates = args.no_repeat;
    config.include_test_sources = args.include_tests;
    config.extra_lib = args.lib;
    config.debug = debug;

    let artifact = scan_project(config, Arc::new(JsonSceneProvider::new())).await?;
    println!("{} {}", "report written to".green().bold(), artifact.display());
    Ok(())
}
