//! Log setup.
//!
//! The terminal belongs to the presentation, so logs go to a file named by
//! `MISSION_LOG_FILE`. Without it nothing is installed and every `tracing`
//! call is a no-op. `MISSION_LOG` takes an `EnvFilter` directive and
//! defaults to `info`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_VAR: &str = "MISSION_LOG_FILE";
pub const LOG_FILTER_VAR: &str = "MISSION_LOG";

pub fn init() -> Result<()> {
    let Some(path) = std::env::var_os(LOG_FILE_VAR) else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.to_string_lossy()))?;
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;
    Ok(())
}
