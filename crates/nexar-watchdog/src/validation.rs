//! Catalog data validation
//!
//! Checks listing data against the allow-lists the host ships with. A
//! rejection is reported like any other failure and ends up as the
//! data-validation flag. Malformed input is rejected without a report.

use crate::reporter::Reporter;
use nexar_core::{FailureKind, ValidationTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// A listing category and its cover image
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Category {
    /// Display name
    pub name: String,
    /// Cover image URL
    pub image: String,
}

impl Category {
    /// Create a category
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }

    fn is_well_formed(&self) -> bool {
        !self.name.is_empty() && !self.image.is_empty()
    }
}

/// Allow-lists for catalog data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Allowed equipment features
    pub features: BTreeSet<String>,
    /// Allowed brands
    pub brands: BTreeSet<String>,
    /// Allowed categories; name and image must both match
    pub categories: BTreeSet<Category>,
}

/// Validates catalog data and reports rejections
#[derive(Debug, Clone)]
pub struct CatalogValidator {
    catalog: Catalog,
    reporter: Arc<Reporter>,
}

impl CatalogValidator {
    /// Create a validator
    #[must_use]
    pub fn new(catalog: Catalog, reporter: Arc<Reporter>) -> Self {
        Self { catalog, reporter }
    }

    fn reject(&self, target: ValidationTarget) -> bool {
        debug!(code = target.code(), "catalog data rejected");
        self.reporter.report(FailureKind::DataValidationFailed(target));
        false
    }

    /// Every feature must be allowed; an empty list is valid
    pub fn validate_features<S: AsRef<str>>(&self, features: &[S]) -> bool {
        let valid = features
            .iter()
            .all(|feature| self.catalog.features.contains(feature.as_ref()));
        valid || self.reject(ValidationTarget::Features)
    }

    /// Brand must be allowed; an empty brand is malformed
    pub fn validate_brand(&self, brand: &str) -> bool {
        if brand.is_empty() {
            return false;
        }
        self.catalog.brands.contains(brand) || self.reject(ValidationTarget::Brand)
    }

    /// Category must match an allowed name and image pair
    pub fn validate_category(&self, category: &Category) -> bool {
        if !category.is_well_formed() {
            return false;
        }
        self.catalog.categories.contains(category) || self.reject(ValidationTarget::Category)
    }

    /// Every category must be valid; stops at the first rejection
    pub fn validate_categories(&self, categories: &[Category]) -> bool {
        let valid = categories.iter().all(|category| self.validate_category(category));
        valid || self.reject(ValidationTarget::Categories)
    }
}
