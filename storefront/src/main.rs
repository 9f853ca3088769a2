// storefront/src/main.rs

// Declare modules for the application
mod cli;
mod config;
mod errors;
mod render;
mod state;

use crate::cli::{Cli, Command};
use crate::config::{AppConfig, LogFormat};
use crate::state::AppState;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  // Logs go to stderr; stdout carries the cart itself.
  let builder = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .with_writer(std::io::stderr);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("{}", e);
      return ExitCode::from(e.exit_code());
    }
  };
  init_tracing(app_config.log_format);
  tracing::debug!(config = ?app_config, "Application configuration loaded.");

  let app_state = if cli.offline {
    AppState::offline()
  } else {
    match AppState::connect(&app_config) {
      Ok(state) => state,
      Err(e) => {
        tracing::error!(error = %e, "Failed to set up the cart service client.");
        return ExitCode::from(e.exit_code());
      }
    }
  };

  let command = cli.command.unwrap_or(Command::Show);
  let mut stdout = std::io::stdout().lock();
  match cli::handlers::run(&app_state, command, cli.json, &mut stdout).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("error: {}", e);
      ExitCode::from(e.exit_code())
    }
  }
}
