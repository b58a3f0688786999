//! Logging setup: append to a file under the XDG state dir, falling back to
//! stderr when that dir cannot be used.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sdm=debug"))
}

fn open_log_file() -> Result<(fs::File, PathBuf)> {
    let dir = crate::config::state_dir()?;
    fs::create_dir_all(&dir)?;
    let path = dir.join("sdm.log");
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Initializes the global subscriber. Never fails: if the log file cannot be
/// opened the daemon still comes up, logging to stderr instead.
pub fn init() {
    let (writer, target) = match open_log_file() {
        Ok((file, path)) => (BoxMakeWriter::new(Mutex::new(file)), Some(path)),
        Err(_) => (BoxMakeWriter::new(io::stderr), None),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    match target {
        Some(path) => tracing::info!("logging to {}", path.display()),
        None => tracing::warn!("state dir unavailable, logging to stderr"),
    }
}
