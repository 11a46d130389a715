//! Language selection
//!
//! The enabled language list is ordered and free of duplicates. Its first
//! entry is the default language, and it can never become empty.

use app_platform::{EnabledLanguages, NativeCall};
use app_state::SettingsDomain;
use storage::{Preferences, WriteBatch};
use thiserror::Error;

use crate::keys::language as keys;

/// Language enabled on a fresh install
pub const FALLBACK_LANGUAGE: &str = "en";

/// Language selection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    /// Removing the language would leave none enabled
    #[error("At least one language must stay enabled")]
    LastLanguage,

    /// The language is not in the enabled list
    #[error("Language {0} is not enabled")]
    NotEnabled(String),

    /// The code is not usable
    #[error("Invalid language code: {0:?}")]
    InvalidCode(String),
}

/// Enabled languages and the active one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSettings {
    enabled: Vec<String>,
    current: String,
    multilingual: bool,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            enabled: vec![FALLBACK_LANGUAGE.to_string()],
            current: FALLBACK_LANGUAGE.to_string(),
            multilingual: false,
        }
    }
}

fn clean_code(code: &str) -> Result<String, LanguageError> {
    let code = code.trim();
    if code.is_empty() || code.contains(char::is_whitespace) {
        return Err(LanguageError::InvalidCode(code.to_string()));
    }
    Ok(code.to_string())
}

impl LanguageSettings {
    /// Build from raw parts, repairing invariants
    pub fn from_parts(
        enabled: Vec<String>,
        default: Option<&str>,
        current: &str,
        multilingual: bool,
    ) -> Self {
        let mut list: Vec<String> = Vec::with_capacity(enabled.len());
        for code in enabled {
            match clean_code(&code) {
                Ok(code) if !list.contains(&code) => list.push(code),
                Ok(_) => {}
                Err(e) => tracing::warn!("dropping stored language: {}", e),
            }
        }
        if list.is_empty() {
            list.push(FALLBACK_LANGUAGE.to_string());
        }

        if let Some(pos) = default.and_then(|d| list.iter().position(|c| c == d.trim())) {
            let code = list.remove(pos);
            list.insert(0, code);
        }

        let current = if list.iter().any(|c| c == current) {
            current.to_string()
        } else {
            list[0].clone()
        };

        Self { enabled: list, current, multilingual }
    }

    /// Enabled languages, default first
    pub fn enabled(&self) -> &[String] {
        &self.enabled
    }

    /// The default language
    pub fn default_language(&self) -> &str {
        &self.enabled[0]
    }

    /// The active language
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Whether multilingual typing is on
    pub fn multilingual(&self) -> bool {
        self.multilingual
    }

    /// Whether a language is enabled
    pub fn is_enabled(&self, code: &str) -> bool {
        self.enabled.iter().any(|c| c == code)
    }

    /// Enable a language; returns false if it already was
    pub fn add(&mut self, code: &str) -> Result<bool, LanguageError> {
        let code = clean_code(code)?;
        if self.is_enabled(&code) {
            return Ok(false);
        }
        self.enabled.push(code);
        Ok(true)
    }

    /// Disable a language
    ///
    /// Refused when it is the only one left. If it was active, the default
    /// language becomes active.
    pub fn remove(&mut self, code: &str) -> Result<(), LanguageError> {
        let pos = self
            .enabled
            .iter()
            .position(|c| c == code)
            .ok_or_else(|| LanguageError::NotEnabled(code.to_string()))?;
        if self.enabled.len() == 1 {
            return Err(LanguageError::LastLanguage);
        }

        self.enabled.remove(pos);
        if self.current == code {
            self.current = self.enabled[0].clone();
        }
        Ok(())
    }

    /// Make an enabled language the default
    pub fn set_default(&mut self, code: &str) -> Result<(), LanguageError> {
        let pos = self
            .enabled
            .iter()
            .position(|c| c == code)
            .ok_or_else(|| LanguageError::NotEnabled(code.to_string()))?;
        let code = self.enabled.remove(pos);
        self.enabled.insert(0, code);
        Ok(())
    }

    /// Make an enabled language active
    pub fn set_current(&mut self, code: &str) -> Result<(), LanguageError> {
        if !self.is_enabled(code) {
            return Err(LanguageError::NotEnabled(code.to_string()));
        }
        self.current = code.to_string();
        Ok(())
    }

    /// Turn multilingual typing on or off
    pub fn set_multilingual(&mut self, enabled: bool) {
        self.multilingual = enabled;
    }
}

impl SettingsDomain for LanguageSettings {
    const NAME: &'static str = "language_settings";

    fn load(prefs: &Preferences<'_>) -> Self {
        let enabled = prefs.string_list(&keys::ENABLED_LANGUAGES, &[FALLBACK_LANGUAGE]);
        let default = prefs.lookup(&keys::DEFAULT_LANGUAGE, |v| v.as_str().map(str::to_string));
        let current = prefs.string(&keys::CURRENT_LANGUAGE, FALLBACK_LANGUAGE);
        let multilingual = prefs.bool(&keys::MULTILINGUAL_ENABLED, false);

        Self::from_parts(enabled, default.as_deref(), &current, multilingual)
    }

    fn write(&self, batch: &mut WriteBatch) {
        batch
            .put(&keys::ENABLED_LANGUAGES, self.enabled.clone())
            .put(&keys::DEFAULT_LANGUAGE, self.default_language())
            .put(&keys::CURRENT_LANGUAGE, self.current.as_str())
            .put(&keys::MULTILINGUAL_ENABLED, self.multilingual);
    }

    fn native_update(&self) -> Option<NativeCall> {
        Some(NativeCall::SetEnabledLanguages(EnabledLanguages {
            enabled: self.enabled.clone(),
            current: self.current.clone(),
        }))
    }

    fn reload_call(&self) -> NativeCall {
        NativeCall::BroadcastSettingsChanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::{MemoryPreferenceStore, PrefValue};

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_default_is_english_only() {
        let settings = LanguageSettings::default();
        assert_eq!(settings.enabled(), &["en"]);
        assert_eq!(settings.default_language(), "en");
        assert_eq!(settings.current(), "en");
        assert!(!settings.multilingual());
    }

    #[test]
    fn test_empty_store_loads_english_only() {
        let store = MemoryPreferenceStore::new();
        let settings = LanguageSettings::load(&Preferences::new(&store));
        assert_eq!(settings, LanguageSettings::default());
        assert_eq!(settings.enabled(), &["en"]);
        assert_eq!(settings.default_language(), "en");
        assert_eq!(settings.current(), "en");
        assert!(!settings.multilingual());
    }

    #[test]
    fn test_add_is_duplicate_free() {
        let mut settings = LanguageSettings::default();
        assert_eq!(settings.add("hi"), Ok(true));
        assert_eq!(settings.add("hi"), Ok(false));
        assert_eq!(settings.enabled(), &["en", "hi"]);
        assert!(matches!(settings.add("  "), Err(LanguageError::InvalidCode(_))));
    }

    #[test]
    fn test_removing_last_language_is_rejected() {
        let mut settings = LanguageSettings::default();
        assert_eq!(settings.remove("en"), Err(LanguageError::LastLanguage));
        assert_eq!(settings.enabled(), &["en"]);
    }

    #[test]
    fn test_remove_current_falls_back_to_default() {
        let mut settings = LanguageSettings::from_parts(langs(&["en", "hi", "fr"]), None, "hi", true);
        settings.remove("hi").unwrap();
        assert_eq!(settings.enabled(), &["en", "fr"]);
        assert_eq!(settings.current(), "en");
    }

    #[test]
    fn test_remove_unknown_language() {
        let mut settings = LanguageSettings::default();
        assert_eq!(settings.remove("de"), Err(LanguageError::NotEnabled("de".into())));
    }

    #[test]
    fn test_set_default_moves_to_front() {
        let mut settings = LanguageSettings::from_parts(langs(&["en", "hi", "fr"]), None, "en", false);
        settings.set_default("fr").unwrap();
        assert_eq!(settings.enabled(), &["fr", "en", "hi"]);
        assert_eq!(settings.default_language(), "fr");
        assert!(settings.set_default("de").is_err());
    }

    #[test]
    fn test_set_current_requires_enabled() {
        let mut settings = LanguageSettings::default();
        assert!(settings.set_current("hi").is_err());
        settings.add("hi").unwrap();
        settings.set_current("hi").unwrap();
        assert_eq!(settings.current(), "hi");
    }

    #[test]
    fn test_from_parts_repairs_invariants() {
        let settings =
            LanguageSettings::from_parts(langs(&["hi", "en", "hi", ""]), Some("en"), "de", false);
        assert_eq!(settings.enabled(), &["en", "hi"]);
        assert_eq!(settings.current(), "en");

        let empty = LanguageSettings::from_parts(Vec::new(), None, "en", false);
        assert_eq!(empty.enabled(), &["en"]);
    }

    #[test]
    fn test_load_from_store() {
        let store = MemoryPreferenceStore::with_entries([
            ("flutter.enabled_languages", PrefValue::StringList(langs(&["en", "hi"]))),
            ("flutter.default_language", PrefValue::String("hi".into())),
            ("flutter.current_language", PrefValue::String("en".into())),
            ("flutter.multilingual_enabled", PrefValue::Bool(true)),
        ]);
        let settings = LanguageSettings::load(&Preferences::new(&store));

        assert_eq!(settings.enabled(), &["hi", "en"]);
        assert_eq!(settings.current(), "en");
        assert!(settings.multilingual());
    }

    #[test]
    fn test_write_stores_default_from_list_head() {
        let settings = LanguageSettings::from_parts(langs(&["fr", "en"]), None, "en", false);
        let mut batch = WriteBatch::new();
        settings.write(&mut batch);

        let store = MemoryPreferenceStore::new();
        batch.apply(&store).unwrap();
        assert_eq!(store.raw("flutter.default_language"), Some(PrefValue::String("fr".into())));
        assert_eq!(
            store.raw("flutter.enabled_languages"),
            Some(PrefValue::StringList(langs(&["fr", "en"])))
        );
    }

    #[test]
    fn test_native_calls() {
        let settings = LanguageSettings::default();
        assert_eq!(settings.reload_call(), NativeCall::BroadcastSettingsChanged);
        assert_eq!(
            settings.native_update(),
            Some(NativeCall::SetEnabledLanguages(EnabledLanguages {
                enabled: langs(&["en"]),
                current: "en".into(),
            }))
        );
    }
}
