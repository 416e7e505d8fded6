// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paloma - relay between a document store and a WhatsApp group.
//!
//! This is the binary entry point for the relay.

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Paloma - relay between a document store and a WhatsApp group.
#[derive(Parser, Debug)]
#[command(name = "paloma", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay (default).
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup; missing required values
    // halt the process with diagnostics and a non-zero exit.
    let config = match paloma_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            paloma_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_subcommand_parses() {
        let cli = Cli::parse_from(["paloma", "serve"]);
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::parse_from(["paloma"]);
        assert!(cli.command.is_none());
    }
}
