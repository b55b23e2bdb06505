//! Error types for flag persistence

use std::path::PathBuf;

/// Errors from the persisted flag store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage is disabled or otherwise unreachable
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// No room for another key
    #[error("storage quota exceeded writing '{key}' (limit {limit} keys)")]
    QuotaExceeded { key: String, limit: usize },

    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file is not a flag map
    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_error_display() {
        let err = StoreError::QuotaExceeded {
            key: "__nx_disabled_search".to_string(),
            limit: 4,
        };
        assert_eq!(
            err.to_string(),
            "storage quota exceeded writing '__nx_disabled_search' (limit 4 keys)"
        );
    }

    #[test]
    fn io_error_carries_path() {
        let err = StoreError::io_error("/tmp/state.json", std::io::Error::other("denied"));
        assert!(err.to_string().contains("/tmp/state.json"));
    }
}
