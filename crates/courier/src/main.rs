// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - outbound SMS dispatch engine.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courier_config::{ConfigError, CourierConfig};

/// Courier - outbound SMS dispatch engine.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll every store and dispatch queued messages until stopped.
    Serve,
    /// Run a single pass over every store, then exit.
    Once,
    /// Validate configuration and print the resolved stores and backends.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<CourierConfig, Vec<ConfigError>> {
    match path {
        Some(path) => courier_config::load_and_validate_path(path),
        None => courier_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Once) => match serve::run_once(config).await {
            Ok(report) => {
                println!(
                    "courier: pass complete ({} store(s) processed, {} failed)",
                    report.completed.len(),
                    report.failed.len()
                );
                if !report.failed.is_empty() {
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::CheckConfig) => match check::describe_config(&config) {
            Ok(report) => println!("{report}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("courier: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_global_config_flag() {
        let cli = Cli::try_parse_from(["courier", "once", "--config", "/etc/courier.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Once)));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/courier.toml")));
    }

    #[test]
    fn cli_accepts_check_config() {
        let cli = Cli::try_parse_from(["courier", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let errors = load(Some(&PathBuf::from("/nonexistent/courier.toml"))).unwrap_err();
        assert!(!errors.is_empty());
    }
}
