//! Storage layer for the keyboard companion
//!
//! This crate provides the local preference store: a typed key-value
//! abstraction with a sled-backed implementation, an in-memory
//! implementation, and legacy key aliasing for backward compatibility.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod keys;
pub mod kv;
pub mod preferences;

pub use keys::SettingKey;
pub use kv::{KvConfig, KvError, KvStore};
pub use preferences::{
    MemoryPreferenceStore, PrefKind, PrefValue, PreferenceEntry, PreferenceStore, Preferences,
    StoreError, WriteBatch,
};
