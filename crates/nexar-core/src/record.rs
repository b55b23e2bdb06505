//! Remote error-log records and diagnostic codes

use crate::failure::FailureKind;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User id recorded when nobody is signed in
pub const ANONYMOUS_USER: Uuid = Uuid::nil();

/// Human-facing text of every record
const RECORD_MESSAGE: &str = "Critical application error. Contact the developer.";

/// Opaque random code shown in log text; carries no meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode(u32);

impl DiagnosticCode {
    /// Exclusive upper bound of raw code values
    pub const SPACE: u64 = 1_000_000;

    /// Wrap a raw value, folding it into the code space
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(u32::try_from(raw % Self::SPACE).unwrap_or_default())
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// One append-only record for the remote log sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogRecord {
    /// Signed-in user, or [`ANONYMOUS_USER`]
    pub user_id: Uuid,
    /// Fixed human-facing message
    pub message: String,
    /// Diagnostic string: code, failure kind and timestamp
    pub full_error: String,
    /// When the failure was reported (embedded in `full_error` on the wire)
    #[serde(skip)]
    pub timestamp: DateTime<Utc>,
}

impl ErrorLogRecord {
    /// Build the record for a reported failure
    #[must_use]
    pub fn new(
        user_id: Option<Uuid>,
        kind: &FailureKind,
        code: DiagnosticCode,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let at = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            user_id: user_id.unwrap_or(ANONYMOUS_USER),
            message: RECORD_MESSAGE.to_string(),
            full_error: format!("[ERR-{code}] {kind} at {at}"),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn code_renders_as_hex() {
        assert_eq!(DiagnosticCode::new(255).to_string(), "ff");
        assert_eq!(DiagnosticCode::new(1_000_255).value(), 255);
    }

    #[test]
    fn anonymous_record_uses_nil_user() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let record = ErrorLogRecord::new(None, &FailureKind::FooterMissing, DiagnosticCode::new(0xabc), at);

        assert_eq!(record.user_id, ANONYMOUS_USER);
        assert_eq!(record.full_error, "[ERR-abc] FOOTER_MISSING at 2026-03-01T12:00:00.000Z");
    }

    #[test]
    fn wire_form_has_sink_fields_only() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let user = Uuid::new_v4();
        let record = ErrorLogRecord::new(Some(user), &FailureKind::LogoMissing, DiagnosticCode::new(1), at);

        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["user_id"], user.to_string());
        assert!(object.contains_key("message"));
        assert!(object.contains_key("full_error"));
    }
}
