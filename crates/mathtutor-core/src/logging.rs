//! File logging for the terminal client.
//!
//! The TUI owns stderr, so events go to `<data dir>/mathtutor/logs/mathtutor.log`.
//!
//! - `MATHTUTOR_LOG`: filter directive (like `RUST_LOG`), e.g. `mathtutor_core=debug`

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "MATHTUTOR_LOG";
pub const LOG_FILE: &str = "mathtutor.log";

const DEFAULT_FILTER: &str = "mathtutor_core=info,mathtutor=info";

pub fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn default_log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("mathtutor").join("logs"))
}

/// Install the global subscriber writing to `dir`.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes and stops the background writer.
pub fn init_logging(dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(build_env_filter())
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(guard)
}
