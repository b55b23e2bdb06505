//! Persisted flag namespace
//!
//! Every key the watchdog persists lives under the `__nx_` prefix. Disabled
//! features are one key each, `__nx_disabled_<featureId>`, so concurrent
//! degradation passes never overwrite each other's choices.

use crate::feature::FeatureId;
use std::borrow::Cow;

/// Prefix shared by every watchdog key
pub const NAMESPACE: &str = "__nx_";

/// Prefix of the per-feature disabled flags
pub const DISABLED_PREFIX: &str = "__nx_disabled_";

/// Value written for boolean flags
pub const FLAG_TRUE: &str = "true";

/// Typed persisted key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKey {
    /// Attribution integrity failed at least once
    IntegrityFailed,
    /// Legacy marker written alongside `IntegrityFailed`
    FeaturesDisabled,
    /// Diagnostic code of the last check error
    SystemError,
    /// Diagnostic code of the last unclassified failure
    UnknownError,
    /// Timestamp noise written on some failures
    CacheCorrupted,
    /// Catalog data validation failed
    DataValidationFailed,
    /// A feature is disabled
    Disabled(FeatureId),
}

impl FlagKey {
    /// Keys that are not per-feature
    pub const FIXED: [FlagKey; 6] = [
        FlagKey::IntegrityFailed,
        FlagKey::FeaturesDisabled,
        FlagKey::SystemError,
        FlagKey::UnknownError,
        FlagKey::CacheCorrupted,
        FlagKey::DataValidationFailed,
    ];

    /// Raw storage key
    #[must_use]
    pub fn as_key(&self) -> Cow<'static, str> {
        match self {
            Self::IntegrityFailed => Cow::Borrowed("__nx_integrity_failed"),
            Self::FeaturesDisabled => Cow::Borrowed("__nx_features_disabled"),
            Self::SystemError => Cow::Borrowed("__nx_system_error"),
            Self::UnknownError => Cow::Borrowed("__nx_unknown_error"),
            Self::CacheCorrupted => Cow::Borrowed("__nx_cache_corrupted"),
            Self::DataValidationFailed => Cow::Borrowed("__nx_data_validation_failed"),
            Self::Disabled(feature) => Cow::Owned(disabled_key(feature.as_str())),
        }
    }

    /// Parse a raw storage key back into a typed key
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(id) = raw.strip_prefix(DISABLED_PREFIX) {
            return id.parse().ok().map(Self::Disabled);
        }
        Self::FIXED.into_iter().find(|key| key.as_key() == raw)
    }
}

/// Raw disabled-flag key for any feature id, catalogued or not
#[must_use]
pub fn disabled_key(feature_id: &str) -> String {
    format!("{DISABLED_PREFIX}{feature_id}")
}
