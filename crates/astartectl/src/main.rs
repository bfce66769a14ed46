mod commands;
mod config;
mod errors;
mod logging;

use std::process;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use commands::{Cli, Commands};
use logging::init_logging;
use tracing::{info, info_span};

#[tokio::main]
async fn main() {
    let start = Instant::now();
    let cli = Cli::parse();
    if let Err(error) = init_logging(&cli.log_level, &cli.log_format) {
        println!("error: {error:#}");
        process::exit(1);
    }
    match dispatch(cli).await {
        Ok(()) => {
            info!(took_ms = %start.elapsed().as_millis(), event = "cmd.finished");
        }
        Err(error) => {
            info!(took_ms = %start.elapsed().as_millis(), event = "cmd.failed");
            // Fatal errors go to stdout and terminate with code 1.
            println!("error: {error:#}");
            process::exit(1);
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Devices(command) => {
            let _span = info_span!("cmd.devices").entered();
            commands::devices::handle(command).await
        }
        Commands::Cluster(command) => {
            let _span = info_span!("cmd.cluster").entered();
            commands::cluster::handle(command).await
        }
        Commands::Completions { shell } => {
            let _span = info_span!("cmd.completions").entered();
            commands::completions::handle(shell)
        }
    }
}
