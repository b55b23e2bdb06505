//! Error types for the watchdog
//!
//! Inside the crate every fallible step returns one of these. Only the public
//! entry points (`verify`, `report`, `apply`) discard them.

use nexar_backend::BackendError;
use nexar_store::StoreError;
use std::path::PathBuf;

/// Page inspection failed
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// Page snapshot could not be read
    #[error("io error reading page {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Page snapshot is not an element tree
    #[error("malformed page {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The page cannot be inspected right now
    #[error("page unavailable: {0}")]
    Unavailable(String),
}

impl InspectError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A timing range is empty
    #[error("invalid range for {name}: [{min_ms}, {max_ms}) is empty")]
    InvalidRange {
        name: &'static str,
        min_ms: u64,
        max_ms: u64,
    },
}

/// Errors assembling or driving the watchdog
#[derive(Debug, thiserror::Error)]
pub enum WatchdogError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// No tokio runtime to spawn background work on
    #[error("no tokio runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    /// Builder is missing a required part
    #[error("watchdog is missing its {0}")]
    MissingComponent(&'static str),
}

/// Result type alias for watchdog assembly
pub type WatchdogResult<T> = Result<T, WatchdogError>;
