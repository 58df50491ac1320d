// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mesabot - a WhatsApp helpdesk assistant for Redmine ticketing.
//!
//! This is the binary entry point for the Mesabot service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod doctor;
mod local;
mod serve;
mod shell;

/// Mesabot - a WhatsApp helpdesk assistant for Redmine ticketing.
#[derive(Parser, Debug)]
#[command(name = "mesabot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the assistant against a stdio message bridge.
    Serve,
    /// Launch an interactive conversation session.
    Shell {
        /// Sender identity to converse as.
        #[arg(long, default_value = "local")]
        sender: String,
    },
    /// Run diagnostic checks against the configured collaborators.
    Doctor {
        /// Run additional intensive checks.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Every subcommand needs a valid configuration; fail fast on a broken one.
    let config = match mesabot_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            mesabot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let outcome = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Shell { sender }) => shell::run_shell(config, &sender).await,
        Some(Commands::Doctor { deep, plain }) => doctor::run_doctor(&config, deep, plain).await,
        None => {
            println!("mesabot: use --help for available commands");
            return;
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
