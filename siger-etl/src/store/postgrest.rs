//! REST client for Supabase-style PostgREST endpoints.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use siger_config::shared::StoreConfig;
use tracing::{debug, info};

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::store::base::match_value;
use crate::store::{RemoteStore, StoreRow};

/// Path under which the store exposes its tables.
const REST_PATH: &str = "rest/v1";

/// Store backed by a PostgREST API such as the one Supabase exposes.
///
/// Every request carries the service key both as `apikey` header and as bearer token.
/// Whole-table reads are paginated by natural key and continue until the server
/// returns an empty page, so a table larger than the server's row limit is still read
/// completely even when that limit is below the configured page size.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    page_size: usize,
}

impl PostgrestStore {
    /// Creates a store client from the store configuration.
    ///
    /// Fails with [`ErrorKind::ConfigError`] when no service key is configured.
    pub fn new(config: &StoreConfig) -> SyncResult<Self> {
        let Some(api_key) = config.service_role_key.clone() else {
            bail!(
                ErrorKind::ConfigError,
                "Remote store service key is not configured"
            );
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
            page_size: config.page_size.max(1),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/{REST_PATH}/{table}", self.base_url);

        self.client
            .request(method, url)
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret())
    }

    async fn send(&self, request: RequestBuilder, table: &str) -> SyncResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read body>".to_string());
        let detail = format!("table '{table}' returned status {status}: {body}");

        if is_rejection(status) {
            bail!(
                ErrorKind::RemoteRejected,
                "Remote store rejected the request",
                detail = detail
            );
        }

        bail!(
            ErrorKind::RemoteUnavailable,
            "Remote store failed to handle the request",
            detail = detail
        )
    }
}

impl RemoteStore for PostgrestStore {
    fn name() -> &'static str {
        "postgrest"
    }

    async fn select(&self, table: &str, key: &str, value: &Value) -> SyncResult<Vec<StoreRow>> {
        let request = self
            .request(Method::GET, table)
            .query(&[(key, format!("eq.{}", filter_value(value)))]);

        let rows = self.send(request, table).await?.json().await?;

        Ok(rows)
    }

    async fn select_all(&self, table: &str, order_key: &str) -> SyncResult<Vec<StoreRow>> {
        let mut rows = Vec::new();
        let mut offset = 0;

        loop {
            let request = self.request(Method::GET, table).query(&[
                ("order", format!("{order_key}.asc")),
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ]);

            let page: Vec<StoreRow> = self.send(request, table).await?.json().await?;
            let page_len = page.len();

            debug!(table, offset, page_len, "fetched page from remote store");

            // The server may cap a page below `limit`, so only an empty page ends the table.
            if page_len == 0 {
                break;
            }
            rows.extend(page);
            offset += page_len;
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<StoreRow>) -> SyncResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        info!(table, row_count = rows.len(), "inserting rows into remote store");

        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(&rows);
        self.send(request, table).await?;

        Ok(())
    }

    async fn update(&self, table: &str, row: StoreRow, match_key: &str) -> SyncResult<()> {
        let filter = format!("eq.{}", filter_value(match_value(&row, match_key)?));

        let request = self
            .request(Method::PATCH, table)
            .query(&[(match_key, filter)])
            .header("Prefer", "return=minimal")
            .json(&row);
        self.send(request, table).await?;

        Ok(())
    }
}

/// Renders a value as a PostgREST filter operand.
fn filter_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Returns whether `status` means the request itself was refused.
///
/// Timeouts and rate limiting are client errors on the wire but say nothing about
/// the request, so they count as the store being unavailable.
fn is_rejection(status: StatusCode) -> bool {
    status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS
}
