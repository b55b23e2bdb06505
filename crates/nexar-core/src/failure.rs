//! Failure taxonomy
//!
//! Every integrity or data-validation failure is classified into a
//! [`FailureKind`]. Kinds travel as upper-snake wire codes (`FOOTER_MISSING`,
//! `INVALID_BRAND`, ...) in log records and across the validation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a data-validation failure was about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationTarget {
    /// A listing's feature list
    Features,
    /// A listing's brand
    Brand,
    /// A single category
    Category,
    /// A category list
    Categories,
}

impl ValidationTarget {
    /// Wire code for this target
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Features => "INVALID_FEATURES",
            Self::Brand => "INVALID_BRAND",
            Self::Category => "INVALID_CATEGORY",
            Self::Categories => "INVALID_CATEGORIES",
        }
    }
}

/// Classification of a failed check
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FailureKind {
    /// No footer region on the page
    FooterMissing,
    /// Footer present but the attribution text was altered
    FooterModified,
    /// Footer present but the logo image is gone
    LogoMissing,
    /// Attribution configuration could not be loaded
    SettingsMissing,
    /// The check itself failed unexpectedly
    CheckError,
    /// Rejected by the catalog data-validation layer
    DataValidationFailed(ValidationTarget),
    /// Any other wire code
    Unknown(String),
}

/// Coarse grouping deciding how the degradation controller reacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Attribution was tampered with or cannot be checked for lack of settings
    Integrity,
    /// Verification machinery failed
    SystemError,
    /// Catalog data was rejected
    DataValidation,
    /// Unclassified
    Unknown,
}

impl FailureKind {
    /// Wire code of this kind
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::FooterMissing => "FOOTER_MISSING",
            Self::FooterModified => "FOOTER_MODIFIED",
            Self::LogoMissing => "LOGO_MISSING",
            Self::SettingsMissing => "SETTINGS_MISSING",
            Self::CheckError => "FOOTER_CHECK_ERROR",
            Self::DataValidationFailed(target) => target.code(),
            Self::Unknown(code) => code,
        }
    }

    /// Parse a wire code; unrecognised codes become [`FailureKind::Unknown`]
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "FOOTER_MISSING" => Self::FooterMissing,
            "FOOTER_MODIFIED" => Self::FooterModified,
            "LOGO_MISSING" => Self::LogoMissing,
            "SETTINGS_MISSING" => Self::SettingsMissing,
            "FOOTER_CHECK_ERROR" => Self::CheckError,
            "INVALID_FEATURES" => Self::DataValidationFailed(ValidationTarget::Features),
            "INVALID_BRAND" => Self::DataValidationFailed(ValidationTarget::Brand),
            "INVALID_CATEGORY" => Self::DataValidationFailed(ValidationTarget::Category),
            "INVALID_CATEGORIES" => Self::DataValidationFailed(ValidationTarget::Categories),
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Failure class
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::FooterMissing | Self::FooterModified | Self::LogoMissing | Self::SettingsMissing => {
                FailureClass::Integrity
            }
            Self::CheckError => FailureClass::SystemError,
            Self::DataValidationFailed(_) => FailureClass::DataValidation,
            Self::Unknown(_) => FailureClass::Unknown,
        }
    }

    /// Whether this kind marks integrity as failed and disables features
    #[inline]
    #[must_use]
    pub fn degrades_features(&self) -> bool {
        self.class() == FailureClass::Integrity
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<&str> for FailureKind {
    fn from(code: &str) -> Self {
        Self::from_code(code)
    }
}

impl From<String> for FailureKind {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<FailureKind> for String {
    fn from(kind: FailureKind) -> Self {
        kind.code().to_string()
    }
}
