//! Error types for backend access

/// Errors talking to the hosted backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Client could not be configured
    #[error("invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    /// Create status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

/// Attribution settings could not be loaded
///
/// Callers treat this as a `SettingsMissing` integrity failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigUnavailable {
    /// Fewer rows than required came back
    #[error("missing settings rows: {missing:?}")]
    MissingRows { missing: Vec<String> },

    /// The fetch itself failed
    #[error("settings fetch failed: {0}")]
    Fetch(#[from] BackendError),
}
