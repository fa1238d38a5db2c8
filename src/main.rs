//! envmon - Main Entry Point
//!
//! Environmental sensor monitoring pipeline with a small CLI.

use clap::Parser;
use envmon::cli::{cmd_generate, cmd_info, cmd_run, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "envmon=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            config,
            artifact,
            plot,
            output,
            temp_threshold,
            air_threshold,
            contamination,
            test_fraction,
            split_seed,
            anomaly_seed,
        } => {
            cmd_run(
                data.as_ref(),
                config.as_ref(),
                artifact.as_ref(),
                plot.as_ref(),
                output.as_ref(),
                temp_threshold,
                air_threshold,
                contamination,
                test_fraction,
                split_seed,
                anomaly_seed.as_deref(),
            )?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
        Commands::Generate { output, rows, seed } => {
            cmd_generate(&output, rows, seed)?;
        }
    }

    Ok(())
}
