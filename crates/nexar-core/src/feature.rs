//! Feature catalog
//!
//! The fixed set of application features the degradation pass may disable.

use crate::error::UnknownFeature;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A feature eligible for degradation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureId {
    /// Creating a new listing
    AddListing,
    /// Editing the user profile
    EditProfile,
    /// Free-text search
    Search,
    /// Listing filters
    Filter,
    /// Contacting a seller
    Contact,
    /// Signing in
    Login,
}

impl FeatureId {
    /// The full catalog in its canonical order
    pub const CATALOG: [FeatureId; 6] = [
        FeatureId::AddListing,
        FeatureId::EditProfile,
        FeatureId::Search,
        FeatureId::Filter,
        FeatureId::Contact,
        FeatureId::Login,
    ];

    /// Stable string id, as used in persisted keys
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddListing => "add-listing",
            Self::EditProfile => "edit-profile",
            Self::Search => "search",
            Self::Filter => "filter",
            Self::Contact => "contact",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureId {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CATALOG
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}
