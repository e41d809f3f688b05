//! Skiff - terminal email client
//!
//! This module wires the application together and owns startup.
//!
//! ## Module Organization
//!
//! - `tui/`: terminal screens (thin, render state and dispatch intents)
//! - `store/`: single-writer mail state store
//! - `backend/`: remote mail API client
//! - `services/`: business logic independent of the view layer
//! - `prefs/`: local preference store
//! - `types/`: data structures and error types
//! - `config/`: configuration management

mod backend;
mod config;
mod prefs;
mod services;
mod store;
mod tui;
mod types;

use std::fs;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use prefs::PrefStore;
use types::error::Result;

pub async fn run() -> Result<()> {
    // Initialize tracing for logging
    // In debug builds, default to debug level for our crate
    // Can be overridden with RUST_LOG environment variable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("skiff=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    // The terminal belongs to the UI, so logs go to a file
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("skiff");
    fs::create_dir_all(&log_dir)?;
    let log_file = fs::File::create(log_dir.join("skiff.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();

    info!("Starting skiff ...");

    let config = config::load()?;
    let prefs = PrefStore::open_default()?;

    tui::run(config, prefs).await
}
