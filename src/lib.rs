//! Keyboard companion settings sync
//!
//! Wires the settings controllers, the local preference store, the native
//! keyboard bridge and the cloud client into one [`Companion`], and
//! provides configuration and logging setup for hosts.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod notices;
pub mod telemetry;

pub use app::{Companion, StartupError};
pub use config::{CompanionConfig, ConfigError};
