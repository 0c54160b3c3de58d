#![cfg_attr(not(test), forbid(unsafe_code))]

//! Main entry point for the Encore support server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::Config;

/// Command-line interface for the Encore support server.
#[derive(Parser)]
#[command(name = "encore-server")]
#[command(about = "Backend server for the Encore support platform", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the backend server
    Serve {
        /// The port number to bind the server to (overrides configuration)
        #[arg(long, short)]
        port: Option<u16>,

        /// Path to the configuration file (YAML or JSON)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let config = Config::load(config, port)?;
            server::server::initialize_tracing(&config);
            server::server::run(config).await
        }
    }
}
