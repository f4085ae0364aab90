//! Tracing initialisation for the desktop process.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "gsa_core=debug,gsa_infrastructure=debug,gsa_application=debug,warn";

/// Installs the global subscriber: stderr plus a daily rolling
/// `gsa.log.YYYY-MM-DD` file in `log_dir`.
///
/// Keep the returned guard alive for the whole process; dropping it stops
/// the file writer.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "gsa.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!("Logging to {}/gsa.log", log_dir.display());
    Ok(guard)
}
