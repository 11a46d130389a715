//! Settings domains for the keyboard companion
//!
//! This crate holds the concrete settings aggregates (typing, emoji,
//! keyboard sound, languages), the preference key table with its legacy
//! aliases, language pack download tracking, and the binary dictionary
//! compiler.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dictionary;
pub mod emoji;
pub mod keys;
pub mod language_packs;
pub mod languages;
pub mod sound;
pub mod typing;

pub use dictionary::{BinaryDictionary, DictionaryError};
pub use emoji::EmojiSettings;
pub use language_packs::{
    DownloadState, DownloadTracker, LanguagePackController, LanguagePackError, RetentionConfig,
};
pub use languages::{LanguageError, LanguageSettings, FALLBACK_LANGUAGE};
pub use sound::SoundSettings;
pub use typing::TypingSettings;
