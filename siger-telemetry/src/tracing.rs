//! Tracing initialization.
//!
//! Installs a global subscriber that writes every event both to standard output
//! and to a (optionally rotating) log file. Records emitted through the `log`
//! crate by dependencies are bridged into the same subscriber.

use std::io;
use std::sync::Once;

use siger_config::shared::{LogRotation, LoggingConfig};
use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to create log directory: {0}")]
    LogDirectory(#[source] io::Error),

    #[error("failed to install the tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to bridge `log` records into tracing: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),
}

/// Flushes buffered log lines to the file when dropped.
///
/// Must be held for the lifetime of the process, otherwise file output stops.
#[must_use = "dropping the flusher stops writing logs to the file"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global subscriber writing to stdout and to the configured log file.
pub fn init_tracing(app_name: &str, config: &LoggingConfig) -> Result<LogFlusher, TracingError> {
    std::fs::create_dir_all(&config.directory).map_err(TracingError::LogDirectory)?;

    let appender = RollingFileAppender::new(
        rotation(config.rotation),
        &config.directory,
        &config.file_prefix,
    );
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_log::LogTracer::init()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    info!(
        app = app_name,
        log_directory = %config.directory.display(),
        "tracing initialized"
    );

    Ok(LogFlusher { _guard: guard })
}

/// Installs a subscriber writing to the test harness output, once per process.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    }
}
