//! Language catalog
//!
//! The languages a user can enable come from a bundled JSON asset. The
//! asset may be a bare array of `{code, name}` objects or an object with a
//! `languages` array. When it cannot be read a small built-in set is used.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use unic_langid::LanguageIdentifier;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Asset could not be read
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Asset is not valid catalog JSON
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// No usable language in the asset
    #[error("Catalog contains no valid languages")]
    Empty,
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// One selectable language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Language code, e.g. `en` or `pt-BR`
    pub code: String,
    /// Display name
    pub name: String,
}

impl LanguageInfo {
    /// Create a catalog entry
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self { code: code.into(), name: name.into() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<LanguageInfo>),
    Wrapped { languages: Vec<LanguageInfo> },
}

const FALLBACK: &[(&str, &str)] =
    &[("en", "English"), ("es", "Spanish"), ("fr", "French"), ("de", "German"), ("hi", "Hindi")];

/// Languages available for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCatalog {
    languages: Vec<LanguageInfo>,
}

impl LanguageCatalog {
    /// Built-in catalog used when the asset is unavailable
    pub fn fallback() -> Self {
        Self {
            languages: FALLBACK.iter().map(|(code, name)| LanguageInfo::new(*code, *name)).collect(),
        }
    }

    /// Parse catalog JSON
    ///
    /// Entries with an invalid or repeated code are skipped.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries = match serde_json::from_str::<CatalogFile>(json)? {
            CatalogFile::List(entries) | CatalogFile::Wrapped { languages: entries } => entries,
        };

        let mut languages: Vec<LanguageInfo> = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.code.parse::<LanguageIdentifier>().is_err() {
                tracing::warn!(code = %entry.code, "skipping catalog entry with invalid code");
                continue;
            }
            if languages.iter().any(|l| l.code == entry.code) {
                continue;
            }
            languages.push(entry);
        }

        if languages.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { languages })
    }

    /// Read a catalog asset
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Read a catalog asset, falling back to the built-in set
    pub fn load_or_fallback(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::fallback();
        };
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(path = %path.display(), "using built-in language catalog: {}", e);
                Self::fallback()
            }
        }
    }

    /// All languages in asset order
    pub fn languages(&self) -> &[LanguageInfo] {
        &self.languages
    }

    /// Look up a language by code
    pub fn get(&self, code: &str) -> Option<&LanguageInfo> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// Display name for a code, or the code itself if unknown
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).map_or(code, |l| l.name.as_str())
    }

    /// Number of languages
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::fallback()
    }
}
