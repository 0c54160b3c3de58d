#![cfg_attr(not(test), forbid(unsafe_code))]

//! Main entry point for the Encore support CLI.

use clap::{Parser, Subcommand};
use dotenv::dotenv;

mod commands;

use commands::{
    inbox::{InboxArgs, handle_inbox},
    open::{OpenArgs, handle_open},
    reply::{ReplyArgs, handle_reply},
    watch::{WatchArgs, handle_watch},
};

/// Encore support CLI
#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Command-line client for the Encore support inbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the Encore CLI
#[derive(Subcommand)]
enum Commands {
    /// List support conversations with unread counts
    Inbox(InboxArgs),

    /// Follow a conversation live (push with polling fallback)
    Watch(WatchArgs),

    /// Send a support reply to a conversation
    Reply(ReplyArgs),

    /// Open a conversation the way a customer would
    Open(OpenArgs),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script
        /// (e.g., bash, zsh, fish, powershell)
        #[arg(long, short)]
        shell: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Inbox(args) => handle_inbox(args).await,
        Commands::Watch(args) => handle_watch(args).await,
        Commands::Reply(args) => handle_reply(args).await,
        Commands::Open(args) => handle_open(args).await,
        Commands::Completion { shell } => commands::completion::generate_completion(&shell),
    }
}
