//! Watchdog configuration
//!
//! Loaded from TOML. Every field has a default carrying the observed
//! constants, so an empty file is a valid configuration:
//!
//! ```toml
//! state_path = "state/flags.json"
//! page_path = "page.json"
//!
//! [backend]
//! url = "https://project.supabase.co"
//! api_key = "public-anon-key"
//!
//! [cadence]
//! boot = { min_ms = 1000, max_ms = 3000 }
//! primary = { min_ms = 60000, max_ms = 180000 }
//! secondary = { min_ms = 30000, max_ms = 90000 }
//! ```

use crate::entropy::DelayRange;
use crate::error::ConfigError;
use nexar_backend::{BackendConfig, SettingKeys};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `backend.api_key`
pub const API_KEY_ENV: &str = "NEXAR_API_KEY";

/// Timer ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cadence {
    /// Delay of the boot check after the load event
    pub boot: DelayRange,
    /// Period of the primary recurring check
    pub primary: DelayRange,
    /// Period of the secondary recurring check; `None` disables it
    pub secondary: Option<DelayRange>,
    /// Delay between a report and its degradation
    pub degradation_delay: DelayRange,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            boot: DelayRange::new(1_000, 3_000),
            primary: DelayRange::new(60_000, 180_000),
            secondary: Some(DelayRange::new(30_000, 90_000)),
            degradation_delay: DelayRange::new(0, 5_000),
        }
    }
}

impl Cadence {
    /// Reject empty ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("cadence.boot", Some(self.boot)),
            ("cadence.primary", Some(self.primary)),
            ("cadence.secondary", self.secondary),
            ("cadence.degradation_delay", Some(self.degradation_delay)),
        ];
        for (name, range) in ranges {
            if let Some(range) = range.filter(|range| !range.is_valid()) {
                return Err(ConfigError::InvalidRange {
                    name,
                    min_ms: range.min_ms,
                    max_ms: range.max_ms,
                });
            }
        }
        Ok(())
    }
}

/// Full watchdog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Hosted backend connection
    pub backend: BackendConfig,
    /// Names of the attribution rows
    pub setting_keys: SettingKeys,
    /// Timer ranges
    pub cadence: Cadence,
    /// Flag store file (the profile)
    pub state_path: PathBuf,
    /// Page snapshot inspected by the CLI
    pub page_path: PathBuf,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            setting_keys: SettingKeys::default(),
            cadence: Cadence::default(),
            state_path: PathBuf::from("nexar-state.json"),
            page_path: PathBuf::from("page.json"),
        }
    }
}

impl WatchdogConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend connection
    #[inline]
    #[must_use]
    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// With timer ranges
    #[inline]
    #[must_use]
    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// With flag store path
    #[inline]
    #[must_use]
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.cadence.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply the environment override
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_toml_str(&text)?.with_env_overrides())
    }

    /// Apply `NEXAR_API_KEY` when set
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.backend.api_key = key;
        }
        self
    }
}
