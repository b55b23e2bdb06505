//! Nexar Watchdog - attribution integrity checks and feature degradation
//!
//! The watchdog periodically inspects the live page for the expected footer
//! attribution. A failed check is reported to the remote error log and, after
//! a short random delay, degrades the application: integrity is marked as
//! failed for the profile and a random handful of features is disabled. The
//! disabled set only grows until an explicit reset.
//!
//! - [`IntegrityVerifier`]: one check, typed (`check`) or reporting (`verify`)
//! - [`Reporter`]: fire-and-forget log write plus delayed degradation
//! - [`DegradationController`]: what each failure kind persists
//! - [`WatchdogScheduler`]: boot check and two recurring checks
//! - [`CatalogValidator`]: allow-list checks on listing data
//!
//! # Example
//!
//! ```rust,ignore
//! use nexar_watchdog::{DocumentTree, Watchdog};
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<nexar_backend::RestBackend>) -> nexar_watchdog::WatchdogResult<()> {
//! let watchdog = Watchdog::builder()
//!     .settings_source(backend.clone())
//!     .log_sink(backend)
//!     .inspector(Arc::new(DocumentTree::default()))
//!     .build()?;
//!
//! let handles = watchdog.start();
//! if watchdog.gate().is_disabled("add-listing") {
//!     // hide the button
//! }
//! handles.abort();
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod degrade;
pub mod entropy;
pub mod error;
pub mod inspect;
pub mod reporter;
pub mod scheduler;
pub mod validation;
pub mod verifier;
pub mod watchdog;

pub use config::{Cadence, WatchdogConfig, API_KEY_ENV};
pub use degrade::{DegradationController, DegradationOutcome, DegradationPass};
pub use entropy::{Clock, DelayRange, RandomSource, SeededRandom, ThreadRandom, TokioClock};
pub use error::{ConfigError, InspectError, WatchdogError, WatchdogResult};
pub use inspect::{DocumentTree, Element, FooterRegion, PageInspector, SnapshotFile};
pub use reporter::Reporter;
pub use scheduler::{WatchdogHandles, WatchdogScheduler};
pub use validation::{Catalog, CatalogValidator, Category};
pub use verifier::IntegrityVerifier;
pub use watchdog::{Watchdog, WatchdogBuilder};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosts embedding the watchdog
    pub use crate::{DocumentTree, Element, Watchdog, WatchdogConfig, WatchdogHandles};
    pub use nexar_core::{FailureKind, FeatureId};
    pub use nexar_store::FeatureGate;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
