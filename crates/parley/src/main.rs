// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - background translation for chat message stores.
//!
//! This is the binary entry point.

mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use parley_config::model::ParleyConfig;
use tracing::error;

/// Parley - background translation for chat message stores.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the translation pipeline until interrupted.
    Serve {
        /// Chats to catch up on at startup.
        #[arg(long = "catch-up", value_name = "CHAT")]
        catch_up: Vec<String>,
    },
    /// Translate the recent untranslated messages of the given chats and exit.
    CatchUp {
        #[arg(required = true, value_name = "CHAT")]
        chats: Vec<String>,
    },
    /// Check the message store and the translation proxy.
    Health,
    /// Inspect the configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Validate the configuration and report problems.
    Validate,
}

fn load_config(path: Option<&std::path::Path>) -> Option<ParleyConfig> {
    let loaded = match path {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => Some(config),
        Err(errors) => {
            parley_config::render_errors(&errors);
            None
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_deref()) else {
        return ExitCode::FAILURE;
    };
    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Serve { catch_up }) => {
            serve::run_serve(config, cli.config, catch_up).await.map(|()| true)
        }
        Some(Commands::CatchUp { chats }) => {
            commands::run_catch_up(&config, &chats).await.map(|()| true)
        }
        Some(Commands::Health) => commands::run_health(&config).await,
        Some(Commands::Config { action: ConfigAction::Show }) => {
            commands::render_config(&config).map(|rendered| {
                print!("{rendered}");
                true
            })
        }
        Some(Commands::Config { action: ConfigAction::Validate }) => {
            println!("configuration is valid");
            Ok(true)
        }
        None => {
            println!("parley: use --help for available commands");
            Ok(true)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
