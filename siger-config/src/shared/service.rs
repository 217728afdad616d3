use serde::{Deserialize, Serialize};

use crate::shared::{
    BatchConfig, LoggingConfig, ScheduleConfig, SourceConfig, StoreConfig,
    StoreConfigWithoutSecrets, ValidationError,
};

/// Complete configuration of the sync service.
///
/// Every section defaults when absent so that [`SyncServiceConfig::validate`]
/// can report the first missing required key by name.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncServiceConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncServiceConfig {
    /// Validates every section, required keys first.
    ///
    /// Required keys are `store.url`, `store.service_role_key`, `source.path` and
    /// `schedule.interval_minutes`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        self.source.validate()?;
        self.schedule.validate()?;
        self.batch.validate()
    }
}

/// Same as [`SyncServiceConfig`] but without secrets, safe to serialize and log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncServiceConfigWithoutSecrets {
    pub store: StoreConfigWithoutSecrets,
    pub source: SourceConfig,
    pub schedule: ScheduleConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

impl From<SyncServiceConfig> for SyncServiceConfigWithoutSecrets {
    fn from(value: SyncServiceConfig) -> Self {
        SyncServiceConfigWithoutSecrets {
            store: value.store.into(),
            source: value.source,
            schedule: value.schedule,
            batch: value.batch,
            logging: value.logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use rust_cli_config::{File, FileFormat};
    use secrecy::ExposeSecret;

    use super::*;
    use crate::shared::LogRotation;

    const VALID: &str = r#"
store:
  url: https://example.supabase.co
  service_role_key: service-key
source:
  path: /data/export.csv
schedule:
  interval_minutes: 15
"#;

    fn parse(yaml: &str) -> SyncServiceConfig {
        rust_cli_config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    fn missing_field(config: &SyncServiceConfig) -> String {
        match config.validate() {
            Err(ValidationError::MissingField { field }) => field,
            other => panic!("expected a missing field error, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_applies_defaults() {
        let config = parse(VALID);

        config.validate().unwrap();
        assert_eq!(
            config
                .store
                .service_role_key
                .as_ref()
                .unwrap()
                .expose_secret(),
            "service-key"
        );
        assert_eq!(config.store.tables.customer, "cliente");
        assert_eq!(config.store.tables.contract, "contrato");
        assert_eq!(config.store.tables.product, "produto");
        assert_eq!(config.store.timeout_secs, StoreConfig::DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.source.path, PathBuf::from("/data/export.csv"));
        assert_eq!(config.source.delimiter_byte(), b';');
        assert_eq!(config.schedule.interval(), Duration::from_secs(15 * 60));
        assert!(config.schedule.run_on_start);
        assert_eq!(config.batch.max_size, BatchConfig::DEFAULT_MAX_SIZE);
        assert_eq!(config.logging.rotation, LogRotation::Daily);
    }

    #[test]
    fn empty_document_reports_store_url_first() {
        let config = SyncServiceConfig::default();

        assert_eq!(missing_field(&config), "store.url");
    }

    #[test]
    fn empty_service_key_is_missing() {
        let config = parse(&VALID.replace("service-key", "\"\""));

        assert_eq!(missing_field(&config), "store.service_role_key");
    }

    #[test]
    fn absent_source_path_is_missing() {
        let config = parse(&VALID.replace("  path: /data/export.csv\n", "  delimiter: \",\"\n"));

        assert_eq!(missing_field(&config), "source.path");
    }

    #[test]
    fn zero_interval_is_missing() {
        let config = parse(&VALID.replace("interval_minutes: 15", "interval_minutes: 0"));

        assert_eq!(missing_field(&config), "schedule.interval_minutes");
    }

    #[test]
    fn multi_byte_delimiter_is_rejected() {
        let mut config = parse(VALID);
        config.source.delimiter = ";;".to_string();

        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidFieldValue {
                field: "source.delimiter".to_string(),
                constraint: "must be exactly one byte".to_string(),
            })
        );
    }

    #[test]
    fn config_without_secrets_drops_credentials() {
        let config = parse(VALID);

        let without_secrets = SyncServiceConfigWithoutSecrets::from(config);

        assert_eq!(without_secrets.store.url, "https://example.supabase.co");
        let rendered = format!("{without_secrets:?}");
        assert!(!rendered.contains("service-key"));
    }
}
