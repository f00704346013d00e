use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{batch::BatchArgs, scan::ScanArgs};

#[derive(Parser)]
#[command(name = "apiscan")]
#[command(about = "Collects system API call sites from application projects")]
#[command(version)]
struct Cli {
    /// Debug-level logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one project into its own report artifact.
    Scan(ScanArgs),

    /// Scan every app project under a directory into one shared artifact.
    Batch(BatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Scan(args) => runtime.block_on(commands::scan::execute(args, cli.debug)),
        Commands::Batch(args) => runtime.block_on(commands::batch::execute(args, cli.debug)),
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
