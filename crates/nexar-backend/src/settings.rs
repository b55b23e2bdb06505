//! Attribution settings
//!
//! Fetches the footer text, developer name and logo URL rows from the
//! settings table and memoizes the result with moka. There is no TTL: the
//! config is refetched only after [`AttributionSettings::invalidate`].

use crate::error::{BackendError, ConfigUnavailable};
use async_trait::async_trait;
use moka::future::Cache;
use nexar_core::AttributionConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// One row of the settings table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRow {
    /// Row key
    pub key: String,
    /// Row value
    pub value: String,
}

impl SettingRow {
    /// Create a row
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Source of settings rows
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Fetch the rows whose key is in `keys`
    async fn fetch_settings(&self, keys: &[&str]) -> Result<Vec<SettingRow>, BackendError>;
}

/// Names of the three attribution rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingKeys {
    /// Row holding the required footer text
    pub text: String,
    /// Row holding the required developer name
    pub name: String,
    /// Row holding the logo URL
    pub logo_url: String,
}

impl Default for SettingKeys {
    fn default() -> Self {
        Self {
            text: "footer_text_key".to_string(),
            name: "footer_name_key".to_string(),
            logo_url: "footer_logo_url".to_string(),
        }
    }
}

impl SettingKeys {
    /// Keys in fetch order
    #[must_use]
    pub fn as_slice(&self) -> [&str; 3] {
        [&self.text, &self.name, &self.logo_url]
    }

    /// Build the config from fetched rows; every key must be present
    pub fn resolve(&self, rows: &[SettingRow]) -> Result<AttributionConfig, ConfigUnavailable> {
        let find = |key: &str| rows.iter().find(|row| row.key == key).map(|row| row.value.clone());

        match (
            find(self.text.as_str()),
            find(self.name.as_str()),
            find(self.logo_url.as_str()),
        ) {
            (Some(text), Some(name), Some(logo)) => Ok(AttributionConfig::new(text, name, logo)),
            (text, name, logo) => {
                let missing = [(&self.text, text), (&self.name, name), (&self.logo_url, logo)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| key.clone())
                    .collect();
                Err(ConfigUnavailable::MissingRows { missing })
            }
        }
    }
}

/// Memoized attribution config loader
pub struct AttributionSettings {
    source: Arc<dyn SettingsSource>,
    keys: SettingKeys,
    cache: Cache<(), AttributionConfig>,
}

impl fmt::Debug for AttributionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributionSettings")
            .field("keys", &self.keys)
            .field("cached", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl AttributionSettings {
    /// Create a loader over `source` using the given row names
    #[must_use]
    pub fn new(source: Arc<dyn SettingsSource>, keys: SettingKeys) -> Self {
        Self {
            source,
            keys,
            cache: Cache::new(1),
        }
    }

    /// Row names in use
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &SettingKeys {
        &self.keys
    }

    /// Load the attribution config, fetching it on first use
    ///
    /// # Errors
    /// [`ConfigUnavailable`] when the fetch fails or any row is missing.
    /// Failures are not cached; the next call fetches again.
    pub async fn load(&self) -> Result<AttributionConfig, ConfigUnavailable> {
        if let Some(cached) = self.cache.get(&()).await {
            return Ok(cached);
        }

        let rows = match self.source.fetch_settings(&self.keys.as_slice()).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "attribution settings fetch failed");
                return Err(err.into());
            }
        };
        let config = self.keys.resolve(&rows)?;
        debug!(rows = rows.len(), "attribution settings loaded");

        self.cache.insert((), config.clone()).await;
        Ok(config)
    }

    /// Drop the memoized config
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
