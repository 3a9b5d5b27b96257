//! # Logging Setup
//!
//! Installs the global `tracing` subscriber: an env filter, a console layer and a plain
//! text file layer. The log file is recreated on every start.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::domain::config::LoggingConfig;

/// Creates the log directory and removes the previous session's log.
fn prepare_log_file(directory: &Path, file: &str) -> Result<()> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;
    let path = directory.join(file);
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("Failed to clear old log {}", path.display()))?;
    }
    Ok(())
}

/// Installs the subscriber. The returned guard flushes the file writer and must be kept
/// alive until the process exits.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let directory = Path::new(&config.directory);
    prepare_log_file(directory, &config.file)?;

    let file_appender = tracing_appender::rolling::never(directory, &config.file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = config
        .console
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install the log subscriber")?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_creates_directory_and_clears_log() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("data");
        prepare_log_file(&logs, "bot.log").unwrap();
        assert!(logs.is_dir());

        fs::write(logs.join("bot.log"), "old session").unwrap();
        prepare_log_file(&logs, "bot.log").unwrap();
        assert!(!logs.join("bot.log").exists());
    }
}
