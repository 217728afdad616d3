use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use siger_etl::error::SyncError;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Captured backtrace wrapper to avoid thiserror's unstable feature detection.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for the sync service process.
///
/// Wraps [`SyncError`] for sync failures and provides variants for the process's
/// own infrastructure.
#[derive(Debug)]
pub enum ServiceError {
    /// A sync run failed.
    Sync(SyncError),
    /// Configuration could not be loaded or is invalid.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// I/O error.
    Io(std::io::Error, CapturedBacktrace),
    /// The scheduled service stopped on an unexpected error.
    Service(anyhow::Error),
}

impl ServiceError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            ServiceError::Sync(_) => "sync error",
            ServiceError::Config(_, _) => "configuration error",
            ServiceError::Io(_, _) => "i/o error",
            ServiceError::Service(_) => "service error",
        }
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            ServiceError::Config(_, cb) | ServiceError::Io(_, cb) => Some(&cb.0),
            ServiceError::Sync(_) | ServiceError::Service(_) => None,
        }
    }

    /// Creates a configuration error from any error.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        ServiceError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("siger-sync failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        if !matches!(self, ServiceError::Sync(err) if err.errors().is_some()) {
            let mut source = Error::source(self);
            let mut idx = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {idx}: {err}\n"));
                source = err.source();
                idx += 1;
            }
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Sync(err) => write!(f, "{err}"),
            ServiceError::Config(source, _) => write!(f, "configuration error: {source}"),
            ServiceError::Io(source, _) => write!(f, "i/o error: {source}"),
            ServiceError::Service(source) => write!(f, "service error: {source}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServiceError::Sync(err) => err.source(),
            ServiceError::Config(source, _) => Some(source.as_ref()),
            ServiceError::Io(source, _) => Some(source),
            ServiceError::Service(source) => source.source(),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<SyncError> for ServiceError {
    fn from(err: SyncError) -> Self {
        ServiceError::Sync(err)
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Service(err)
    }
}
