//! Nexar Core - watchdog data model
//!
//! Shared vocabulary for the integrity watchdog:
//! - The fixed feature catalog eligible for degradation
//! - The failure taxonomy and its wire codes
//! - Attribution configuration and remote error-log records
//! - The `__nx_` persisted flag namespace
//!
//! # Example
//!
//! ```rust
//! use nexar_core::{FailureKind, FeatureId, FlagKey};
//!
//! let kind: FailureKind = "FOOTER_MISSING".into();
//! assert!(kind.degrades_features());
//!
//! let key = FlagKey::Disabled(FeatureId::Search);
//! assert_eq!(key.as_key(), "__nx_disabled_search");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod attribution;
pub mod error;
pub mod failure;
pub mod feature;
pub mod keys;
pub mod record;

pub use attribution::AttributionConfig;
pub use error::UnknownFeature;
pub use failure::{FailureClass, FailureKind, ValidationTarget};
pub use feature::FeatureId;
pub use keys::{disabled_key, FlagKey, DISABLED_PREFIX, FLAG_TRUE, NAMESPACE};
pub use record::{DiagnosticCode, ErrorLogRecord, ANONYMOUS_USER};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the watchdog data model
    pub use crate::{
        AttributionConfig, DiagnosticCode, ErrorLogRecord, FailureClass, FailureKind, FeatureId,
        FlagKey, ValidationTarget,
    };
}
