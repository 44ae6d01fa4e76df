//! Logging setup
//!
//! Console output always; daily-rolling file output when a log directory is
//! configured.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::BoxError;

pub const DEFAULT_FILTER: &str = "opsdesk_server=info,tower_http=info";

/// Build the filter from an explicit directive, else `RUST_LOG`, else the default
pub fn env_filter(directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(d) => EnvFilter::try_new(d).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process.
pub fn init_logger(
    log_level: Option<&str>,
    log_dir: Option<&str>,
) -> Result<Option<WorkerGuard>, BoxError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        std::fs::create_dir_all(log_path)?;
        let file_appender = tracing_appender::rolling::daily(log_path, "opsdesk-server.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        subscriber
            .with_writer(std::io::stdout.and(file_writer))
            .with_ansi(false)
            .try_init()?;
        return Ok(Some(guard));
    }

    subscriber.try_init()?;
    Ok(None)
}
