//! Nexar Store - persisted watchdog state
//!
//! Profile-scoped key/value persistence for integrity state and disabled
//! features:
//! - [`FlagStore`]: raw string store (in-memory or file backed)
//! - [`IntegrityStore`]: typed accessors over [`nexar_core::FlagKey`]
//! - [`FeatureGate`]: fail-open read queries for the UI layer
//!
//! # Example
//!
//! ```rust
//! use nexar_core::FeatureId;
//! use nexar_store::{FeatureGate, IntegrityStore};
//!
//! let store = IntegrityStore::in_memory();
//! store.disable_feature(FeatureId::Contact).unwrap();
//!
//! let gate = FeatureGate::new(store.clone());
//! assert!(gate.is_disabled("contact"));
//!
//! store.reset().unwrap();
//! assert!(!gate.is_disabled("contact"));
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod file;
pub mod flag_store;
pub mod gate;
pub mod integrity;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use flag_store::{FlagStore, MemoryStore};
pub use gate::FeatureGate;
pub use integrity::{IntegritySnapshot, IntegrityStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
