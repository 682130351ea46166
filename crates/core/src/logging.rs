use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `~/.rootscope/logs`, or `./.rootscope/logs` when no home directory is known.
pub fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rootscope/logs")
}

/// Install the global subscriber.
///
/// Returns the guard of the non-blocking file writer; dropping it flushes and
/// stops the writer thread. Fails if a global subscriber is already installed.
pub fn init_logging(
    log_dir: &Path,
    component: &str,
    to_stderr: bool,
) -> crate::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Roll daily, with the component name as the prefix (scan.log.2026-01-21)
    let file_appender = tracing_appender::rolling::daily(log_dir, component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    let installed = if to_stderr {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        registry.with(stderr_layer).try_init()
    } else {
        registry.try_init()
    };
    installed.map_err(|e| crate::RootscopeError::Config(e.to_string()))?;

    Ok(guard)
}
