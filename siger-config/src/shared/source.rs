use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Location and dialect of the delimited export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// File read for every entity that has no override in [`SourceConfig::files`].
    #[serde(default)]
    pub path: PathBuf,
    /// Field delimiter, exactly one byte.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Encoding label (`utf-8`, `windows-1252`, ...) that bypasses detection.
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub files: SourceFilesConfig,
}

impl SourceConfig {
    /// Returns the delimiter as a byte.
    ///
    /// Only meaningful after [`SourceConfig::validate`] succeeded.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b';')
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::missing("source.path"));
        }

        if self.delimiter.len() != 1 {
            return Err(ValidationError::invalid(
                "source.delimiter",
                "must be exactly one byte",
            ));
        }

        if let Some(encoding) = &self.encoding
            && encoding.trim().is_empty()
        {
            return Err(ValidationError::invalid(
                "source.encoding",
                "must not be empty when set",
            ));
        }

        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            delimiter: default_delimiter(),
            encoding: None,
            files: SourceFilesConfig::default(),
        }
    }
}

/// Optional per-entity source files overriding [`SourceConfig::path`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceFilesConfig {
    pub customer: Option<PathBuf>,
    pub contract: Option<PathBuf>,
    pub product: Option<PathBuf>,
}

fn default_delimiter() -> String {
    ";".to_string()
}
