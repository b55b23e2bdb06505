//! Nexar Backend - hosted data store access for the watchdog
//!
//! The backend is an opaque row store reached over PostgREST-style HTTP
//! calls. The watchdog needs exactly two things from it:
//!
//! - **Attribution settings**: three named rows of the settings table,
//!   fetched once and memoized for the process lifetime
//! - **Error log**: append-only records, written best-effort
//!
//! ```text
//! AttributionSettings ──► SettingsSource ──┐
//!        (moka cache)                      ├──► RestBackend ──► HTTP
//! Reporter ─────────────► LogSink ─────────┘
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod log_sink;
pub mod rest;
pub mod settings;

pub use error::{BackendError, ConfigUnavailable};
pub use log_sink::{LogSink, NullLogSink};
pub use rest::{BackendConfig, RestBackend};
pub use settings::{AttributionSettings, SettingKeys, SettingRow, SettingsSource};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
