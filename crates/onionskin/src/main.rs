mod cli;
mod commands;
mod config;
mod report;

use clap::Parser;
use config::{CliOverrides, ResolvedCompareConfig};
use onionskin::Pan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("onionskin=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Init { force } => {
            commands::init(force)?;
        }
        cli::Command::Compare {
            previous,
            current,
            mode,
            sensitivity,
            opacity,
            zoom,
            pan_x,
            pan_y,
            viewport,
            output,
            json,
        } => {
            let overrides = CliOverrides {
                mode,
                sensitivity,
                opacity,
                zoom,
                viewport,
            };
            let config = ResolvedCompareConfig::new(overrides)?;
            let args = commands::CompareArgs {
                previous,
                current,
                pan: Pan::new(pan_x, pan_y),
                output,
                json,
            };
            let code = commands::compare(config, args).await?;
            std::process::exit(code);
        }
    }

    Ok(())
}
