use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Connection settings for the remote store's REST endpoint.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking the service credential into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Base URL of the store, e.g. `https://<project>.supabase.co`.
    #[serde(default)]
    pub url: String,
    /// Service credential sent with every request. Redacted in debug output.
    #[serde(default)]
    pub service_role_key: Option<SecretString>,
    /// Timeout applied to every request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of rows requested per page when reading a whole table.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub tables: TablesConfig,
}

impl StoreConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const DEFAULT_PAGE_SIZE: usize = 1000;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::missing("store.url"));
        }

        match &self.service_role_key {
            Some(key) if !key.expose_secret().trim().is_empty() => {}
            _ => return Err(ValidationError::missing("store.service_role_key")),
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::invalid(
                "store.timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.page_size == 0 {
            return Err(ValidationError::invalid(
                "store.page_size",
                "must be greater than 0",
            ));
        }

        self.tables.validate()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_role_key: None,
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            tables: TablesConfig::default(),
        }
    }
}

/// Table names of each entity in the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TablesConfig {
    #[serde(default = "default_customer_table")]
    pub customer: String,
    #[serde(default = "default_contract_table")]
    pub contract: String,
    #[serde(default = "default_product_table")]
    pub product: String,
}

impl TablesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("store.tables.customer", &self.customer),
            ("store.tables.contract", &self.contract),
            ("store.tables.product", &self.product),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::missing(field));
            }
        }

        Ok(())
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            customer: default_customer_table(),
            contract: default_contract_table(),
            product: default_product_table(),
        }
    }
}

/// Same as [`StoreConfig`] but without secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfigWithoutSecrets {
    pub url: String,
    pub timeout_secs: u64,
    pub page_size: usize,
    pub tables: TablesConfig,
}

impl From<StoreConfig> for StoreConfigWithoutSecrets {
    fn from(value: StoreConfig) -> Self {
        StoreConfigWithoutSecrets {
            url: value.url,
            timeout_secs: value.timeout_secs,
            page_size: value.page_size,
            tables: value.tables,
        }
    }
}

fn default_timeout_secs() -> u64 {
    StoreConfig::DEFAULT_TIMEOUT_SECS
}

fn default_page_size() -> usize {
    StoreConfig::DEFAULT_PAGE_SIZE
}

fn default_customer_table() -> String {
    "cliente".to_string()
}

fn default_contract_table() -> String {
    "contrato".to_string()
}

fn default_product_table() -> String {
    "produto".to_string()
}
