//! Remote error-log sink

use crate::error::BackendError;
use async_trait::async_trait;
use nexar_core::ErrorLogRecord;
use tracing::trace;

/// Append-only destination for error records
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append one record
    async fn append(&self, record: &ErrorLogRecord) -> Result<(), BackendError>;
}

/// Sink that drops every record
///
/// For hosts running without a backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogSink;

#[async_trait]
impl LogSink for NullLogSink {
    async fn append(&self, record: &ErrorLogRecord) -> Result<(), BackendError> {
        trace!(full_error = %record.full_error, "error record dropped");
        Ok(())
    }
}
