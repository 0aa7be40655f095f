use std::{fs::OpenOptions, path::Path, path::PathBuf};

use anyhow::Context;
use env_logger::Target;
use log::LevelFilter;

use crate::Result;

pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("gps-radar.log")
}

/// Set up colog, writing to `path` since the terminal belongs to the UI.
/// `RUST_LOG` takes precedence over `level`.
pub fn init(level: LevelFilter, path: &Path) -> Result {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    colog::default_builder()
        .filter_level(level)
        .parse_default_env()
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .context("Failed to initialize logging")
}
