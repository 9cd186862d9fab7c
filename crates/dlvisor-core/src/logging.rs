//! Logging init: file under XDG state dir, or graceful fallback to stderr.
//!
//! Stdout belongs to the status renderer, so diagnostics never go there.

use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const FILE_FILTER: &str = "info,dlvisor_core=debug";
const STDERR_FILTER: &str = "warn";

/// Path of the log file: `~/.local/state/dlvisor/dlvisor.log`.
/// Creates the parent directory when missing.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlvisor")?;
    Ok(xdg_dirs.place_state_file("dlvisor.log")?)
}

/// `RUST_LOG` when set and valid, otherwise `fallback`.
fn filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install a subscriber appending to the XDG state log file.
///
/// Returns `Err` when the file cannot be opened or a subscriber is already
/// installed; the CLI then falls back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter_or(FILE_FILTER))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow!("install subscriber: {e}"))?;

    tracing::info!(path = %path.display(), "dlvisor logging initialized");
    Ok(())
}

/// Stderr-only logging for when the log file is unavailable.
///
/// Defaults to warnings and errors since anything printed lands between
/// status redraws.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_or(STDERR_FILTER))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

