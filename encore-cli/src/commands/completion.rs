//! Module for generating shell completion scripts for the CLI.

use std::io;

use anyhow::{Result, anyhow};
use clap::CommandFactory;
use clap_complete::{generate, shells::Shell};

/// Generates a completion script for `shell` on stdout.
pub fn generate_completion(shell: &str) -> Result<()> {
    let shell: Shell = shell
        .parse()
        .map_err(|_| anyhow!("unsupported shell: {shell}"))?;
    let mut app = crate::Cli::command();
    generate(shell, &mut app, "encore", &mut io::stdout());
    Ok(())
}
