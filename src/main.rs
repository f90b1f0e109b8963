// src/main.rs

//! Command-line entry point: provisions or rotates the admin account.

use admin_bootstrap::bootstrap;
use admin_bootstrap::config::Config;
use anyhow::Result;
use std::env;
use tracing::error;

const USAGE: &str = "\
Usage: ADMIN_USER=<username> ADMIN_PASS=<password> [ADMIN_EMAIL=<email>] [DATA_DIR=<dir>] \\
       admin-bootstrap [--config <path>]

  ADMIN_USER / ADMIN_USERNAME   3-32 characters of letters, digits, '_', '.' or '-'
  ADMIN_PASS / ADMIN_PASSWORD   8-256 characters
  ADMIN_EMAIL                   optional email address
  DATA_DIR                      directory holding users.json (default: ./data)";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--version") {
        println!("admin-bootstrap version {VERSION}");
        return Ok(());
    }
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let config_path = match args.iter().position(|arg| arg == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => Some(path.as_str()),
            None => {
                eprintln!("--config flag requires a value");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let config = match Config::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    // Logs go to stderr so stdout carries only the confirmation.
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(true)
        .init();

    match bootstrap::run(&config).await {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(e) if e.is_usage_error() => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
        Err(e) => {
            error!("Admin bootstrap failed: {}", e);
            Err(e.into())
        }
    }
}
