//! Batch scan: every app project under a directory, one shared artifact.

use super::FormatArg;
use anyhow::Result;
use apiscan_collector::{BatchScanCoordinator, JsonSceneProvider, ScanSessionConfig};
use clap::Args;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Clone)]
pub struct BatchArgs {
    /// Directory whose subdirectories are the app projects to scan.
    pub dir: PathBuf,

    /// SDK root containing the platform declaration files.
    #[arg(long)]
    pub sdk: PathBuf,

    /// Where to write the shared report (defaults to the batch directory).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,

    /// Suppress duplicate findings across all projects.
    #[arg(long)]
    pub no_repeat: bool,

    /// Also scan test source trees.
    #[arg(long)]
    pub include_tests: bool,

    /// Extra library path handed to the analysis engine.
    #[arg(long)]
    pub lib: Option<PathBuf>,
}

pub async fn execute(args: BatchArgs, debug: bool) -> Result<()> {
    let mut template = ScanSessionConfig::new(&args.dir, &args.sdk);
    template.output_root = args.output.unwrap_or_else(|| args.dir.clone());
    template.format = args.format.into();
    template.suppress_duplicates = args.no_repeat;
    template.include_test_sources = args.include_tests;
    template.extra_lib = args.lib;
    template.debug = debug;

    let coordinator =
        BatchScanCoordinator::new(&args.dir, template, Arc::new(JsonSceneProvider::new()));
    match coordinator.run().await? {
        Some(artifact) => {
            println!("{} {}", "report written to".green().bold(), artifact.display());
        }
        None => {
            println!("{} {}", "no app project found in".yellow(), args.dir.display());
        }
    }
    Ok(())
}
