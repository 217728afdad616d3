use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How often the log file is rotated.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    /// A single append-only file.
    Never,
    Hourly,
    #[default]
    Daily,
}

/// Log output settings.
///
/// Logs are always written to standard output as well as to the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Directory holding the log files, created when missing.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// File name, or file name prefix when rotation is enabled.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default)]
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            file_prefix: default_file_prefix(),
            rotation: LogRotation::default(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_file_prefix() -> String {
    "service.log".to_string()
}
