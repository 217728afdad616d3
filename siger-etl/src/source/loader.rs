use std::path::Path;
use std::sync::Arc;

use encoding_rs::Encoding;
use siger_config::shared::SourceConfig;
use tracing::info;

use crate::{bail, sync_error};
use crate::encoding::{decode, encoding_for_label};
use crate::error::{ErrorKind, SyncResult};
use crate::source::RawRow;

/// Parses the delimited export into [`RawRow`]s and checks its header.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
    encoding: Option<&'static Encoding>,
}

impl CsvLoader {
    /// Creates a loader for `delimiter` that detects the encoding of every file.
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            encoding: None,
        }
    }

    /// Uses `encoding` instead of detecting it.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Builds a loader from the source section of the configuration.
    pub fn from_config(config: &SourceConfig) -> SyncResult<Self> {
        let loader = Self::new(config.delimiter_byte());

        match &config.encoding {
            Some(label) => Ok(loader.with_encoding(encoding_for_label(label)?)),
            None => Ok(loader),
        }
    }

    /// Reads and parses the file at `path`.
    pub async fn load(&self, path: &Path, required_columns: &[&str]) -> SyncResult<Vec<RawRow>> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            sync_error!(
                ErrorKind::IoError,
                "Reading the source file failed",
                detail = format!("{}: {err}", path.display()),
                source: err
            )
        })?;

        self.parse(&bytes, required_columns)
    }

    /// Parses the contents of an export.
    ///
    /// Fails with [`ErrorKind::SchemaError`] when no header columns are found or when
    /// any of `required_columns` is missing from the header. Header labels are compared
    /// exactly after trimming surrounding whitespace.
    pub fn parse(&self, bytes: &[u8], required_columns: &[&str]) -> SyncResult<Vec<RawRow>> {
        let text = decode(bytes, self.encoding);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();

        if headers.iter().all(|header| header.is_empty()) {
            bail!(
                ErrorKind::SchemaError,
                "Source file has no columns",
                "no columns detected in the header row"
            );
        }

        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|header| header == column))
            .collect();
        if !missing.is_empty() {
            bail!(
                ErrorKind::SchemaError,
                "Source file is missing required columns",
                detail = missing.join(", ")
            );
        }

        let headers: Arc<[String]> = headers.into();
        let mut rows = Vec::new();
        for (position, record) in reader.records().enumerate() {
            let record = record?;
            let values = record.iter().map(str::to_string).collect();
            rows.push(RawRow::new(position + 1, Arc::clone(&headers), values));
        }

        info!(
            columns = ?headers,
            row_count = rows.len(),
            "loaded source rows"
        );

        Ok(rows)
    }
}
