//! driftsense - Main Entry Point

use clap::Parser;
use driftsense::cli::{cmd_compare, cmd_monitor, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftsense=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare { method, reference, incoming, column, alternative, mode, bins } => {
            cmd_compare(method, &reference, &incoming, &column, alternative, mode, bins)?;
        }
        Commands::Monitor { reference, stream, target, config, svm } => {
            cmd_monitor(&reference, &stream, &target, config.as_deref(), svm.as_deref())?;
        }
    }

    Ok(())
}
