//! unitdiff CLI entry point

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;
mod selection;
mod settings;

#[derive(Parser)]
#[command(name = "unitdiff")]
#[command(about = "Find the build units affected by a set of changed files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level when not verbose
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two build graphs and report the affected units
    Diff(commands::DiffArgs),
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries formatter output
    let log_level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "unitdiff={0},unitdiff_core={0},unitdiff_fs={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("unitdiff v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Diff(args) => commands::diff(args).await,
        Commands::Version => {
            println!("unitdiff v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
