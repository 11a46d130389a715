//! Settings state management for the keyboard companion
//!
//! This crate provides the debounce scheduler and the generic settings
//! controller that moves edits from memory to the preference store, the
//! keyboard service, and the cloud store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod debounce;
pub mod feedback;

pub use controller::{
    ControllerDeps, ControllerError, ControllerState, DebounceConfig, SettingsController,
    SettingsDomain,
};
pub use debounce::Debouncer;
pub use feedback::Feedback;
