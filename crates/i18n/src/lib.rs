//! Internationalization for the keyboard companion
//!
//! This crate provides the language catalog shown on the language screen
//! and localized user feedback messages.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod messages;

pub use catalog::{CatalogError, LanguageCatalog, LanguageInfo};
pub use messages::{MessageError, Messages};
