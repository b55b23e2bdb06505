//! PostgREST client
//!
//! Settings:  `GET  {url}/rest/v1/{settings_table}?select=key,value&key=in.(a,b,c)`
//! Error log: `POST {url}/rest/v1/{log_table}`
//!
//! Both requests carry the project key as `apikey` and as a bearer token.

use crate::error::BackendError;
use crate::log_sink::LogSink;
use crate::settings::{SettingRow, SettingsSource};
use async_trait::async_trait;
use nexar_core::ErrorLogRecord;
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Connection settings for the hosted backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project base URL
    pub url: String,
    /// Public API key
    pub api_key: String,
    /// Table holding key/value settings rows
    pub settings_table: String,
    /// Table receiving error records
    pub log_table: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            settings_table: "app_settings".to_string(),
            log_table: "error_logs".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

impl BackendConfig {
    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// REST endpoint of a table
    #[must_use]
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), table)
    }
}

/// HTTP client for the hosted backend
#[derive(Debug, Clone)]
pub struct RestBackend {
    config: BackendConfig,
    http: reqwest::Client,
}

impl RestBackend {
    /// Build a client from configuration
    ///
    /// # Errors
    /// [`BackendError::InvalidConfig`] for an empty URL, or a transport error
    /// if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        if config.url.trim().is_empty() {
            return Err(BackendError::InvalidConfig("backend url is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("nexar-watchdog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }
}

/// PostgREST `in` filter for a list of keys
fn in_filter(keys: &[&str]) -> String {
    format!("in.({})", keys.join(","))
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::status(status.as_u16(), body))
}

#[async_trait]
impl SettingsSource for RestBackend {
    async fn fetch_settings(&self, keys: &[&str]) -> Result<Vec<SettingRow>, BackendError> {
        let url = self.config.table_url(&self.config.settings_table);
        let filter = in_filter(keys);
        debug!(url = %url, filter = %filter, "fetching settings rows");

        let response = self
            .authorized(self.http.get(&url))
            .query(&[("select", "key,value"), ("key", filter.as_str())])
            .send()
            .await?;
        let rows = ensure_success(response).await?.json::<Vec<SettingRow>>().await?;
        Ok(rows)
    }
}

#[async_trait]
impl LogSink for RestBackend {
    async fn append(&self, record: &ErrorLogRecord) -> Result<(), BackendError> {
        let url = self.config.table_url(&self.config.log_table);
        let response = self
            .authorized(self.http.post(&url))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
