//! Cloud settings sync for the keyboard companion
//!
//! This crate provides the best-effort cloud sync client: settings
//! documents are upserted to a remote store over HTTP, and failures are
//! reported to the caller without retry.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cloud;

pub use cloud::{
    CloudConfig, CloudError, CloudSyncClient, DisabledCloudSync, HttpCloudSync, SettingsDocument,
};
