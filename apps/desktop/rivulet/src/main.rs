// Prevents additional console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use rivulet::error::ShellError;
use rivulet::logger::initialize as LoggerInitialize;
use rivulet::shell;

use std::fs::create_dir_all;

use log::{debug, info};

/// Port the bridge server binds on localhost.
const BRIDGE_PORT: u16 = 18530;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("rivulet failed to start: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ShellError> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ShellError::shell("No platform data directory available"))?
        .join(host_core::APP_NAME);
    let log_dir = data_dir.join("logs");

    create_dir_all(&log_dir)
        .map_err(|e| ShellError::shell(format!("Failed to create log directory: {e}")))?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("Rivulet shell starting");
    info!("Data directory: {}", data_dir.display());
    info!("Log directory: {}", log_dir.display());

    let shell = shell::bootstrap(&data_dir, BRIDGE_PORT).await?;
    info!("Bridge server ready on port {}", shell.access.port());
    debug!("Bridge auth token: {}", shell.access.auth_token());

    // A second launch carries a deep link in argv; the first launch usually
    // has none.
    shell::publish_argv_links(&shell, std::env::args().skip(1));

    // The shell runs until the OS asks it to stop; all further work arrives
    // over the bridge.
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ShellError::shell(format!("Failed to wait for shutdown signal: {e}")))?;
    info!("Rivulet shell shutting down");
    Ok(())
}
