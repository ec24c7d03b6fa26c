pub mod cli;
pub mod core;
pub mod engine;
pub mod store;

pub use cli::commands::AppCommand;

use crate::core::clock::SystemClock;
use crate::core::config::AppConfig;
use crate::engine::CashbackService;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Service backed by the store the config selects and the local calendar.
pub fn build_service(config: &AppConfig) -> Result<CashbackService> {
    let store = store::open(config)?;
    Ok(CashbackService::new(store, Arc::new(SystemClock)))
}

/// Runs a single command and returns what should be printed.
pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<String> {
    info!("Cashback helper starting...");
    let config = load_config(config_path)?;
    let service = build_service(&config)?;
    cli::commands::execute(command, &service, config.currency.as_deref()).await
}

/// Starts an interactive session on stdin and stdout.
pub async fn run_shell(config_path: Option<&str>) -> Result<()> {
    info!("Cashback helper starting interactive session...");
    let config = load_config(config_path)?;
    let service = build_service(&config)?;
    let stdin = std::io::stdin();
    cli::repl::run(
        &service,
        config.currency.as_deref(),
        stdin.lock(),
        std::io::stdout(),
    )
    .await
}
