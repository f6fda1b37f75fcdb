//! Wavconv CLI
//!
//! Command-line interface for batch conversion to PCM WAV.

use clap::Parser;
use env_logger::Env;
use log::info;

use wavconv::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Wavconv v{}", env!("CARGO_PKG_VERSION"));

    let succeeded = match cli.command {
        Commands::Convert {
            inputs,
            output,
            format,
        } => commands::convert(&inputs, &output, format.resolve()?).await?,
        Commands::Inspect { inputs, format } => {
            commands::inspect(&inputs, format.resolve()?).await?
        }
    };

    if !succeeded {
        anyhow::bail!("one or more files could not be processed");
    }
    Ok(())
}
