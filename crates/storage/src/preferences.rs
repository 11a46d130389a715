//! Typed preference access
//!
//! The [`PreferenceStore`] trait is the seam between settings logic and
//! persistence. Reads go through [`Preferences`], which never fails: a
//! missing key, a value of the wrong type, or a store error all degrade to
//! the caller's default. Writes go through [`WriteBatch`], which mirrors
//! every logical setting to all of its legacy keys.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;

use crate::keys::SettingKey;
use crate::kv::KvError;

/// Preference store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying key-value store failed
    #[error("Key-value store error: {0}")]
    Kv(#[from] KvError),

    /// Store cannot accept writes right now
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for preference store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// A stored preference value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating-point value
    Double(f64),
    /// String value
    String(String),
    /// Ordered list of strings
    StringList(Vec<String>),
}

/// The type of a stored preference value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKind {
    /// Boolean flag
    Bool,
    /// Integer value
    Int,
    /// Floating-point value
    Double,
    /// String value
    String,
    /// Ordered list of strings
    StringList,
}

impl PrefValue {
    /// Get the kind of this value
    pub fn kind(&self) -> PrefKind {
        match self {
            PrefValue::Bool(_) => PrefKind::Bool,
            PrefValue::Int(_) => PrefKind::Int,
            PrefValue::Double(_) => PrefKind::Double,
            PrefValue::String(_) => PrefKind::String,
            PrefValue::StringList(_) => PrefKind::StringList,
        }
    }

    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PrefValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a double, widening stored integers
    pub fn as_double(&self) -> Option<f64> {
        match self {
            PrefValue::Double(d) => Some(*d),
            PrefValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a list of strings
    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            PrefValue::StringList(list) => Some(list),
            _ => None,
        }
    }

    /// Convert to a JSON value for documents and payloads
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PrefValue::Bool(b) => serde_json::Value::Bool(*b),
            PrefValue::Int(i) => serde_json::Value::from(*i),
            PrefValue::Double(d) => serde_json::Value::from(*d),
            PrefValue::String(s) => serde_json::Value::String(s.clone()),
            PrefValue::StringList(list) => serde_json::Value::from(list.clone()),
        }
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Bool(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        PrefValue::Int(value)
    }
}

impl From<u32> for PrefValue {
    fn from(value: u32) -> Self {
        PrefValue::Int(i64::from(value))
    }
}

impl From<f64> for PrefValue {
    fn from(value: f64) -> Self {
        PrefValue::Double(value)
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        PrefValue::String(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_string())
    }
}

impl From<Vec<String>> for PrefValue {
    fn from(value: Vec<String>) -> Self {
        PrefValue::StringList(value)
    }
}

/// A single physical key and its value
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceEntry {
    /// Physical store key
    pub key: String,
    /// Stored value
    pub value: PrefValue,
}

impl PreferenceEntry {
    /// Create a new entry
    pub fn new(key: impl Into<String>, value: PrefValue) -> Self {
        Self { key: key.into(), value }
    }
}

/// Persistent key-value storage for preferences
///
/// Implementations must survive process restarts (except explicitly
/// temporary stores) and apply a batch as a single write.
pub trait PreferenceStore: Send + Sync {
    /// Read the raw value stored under a physical key
    fn get(&self, key: &str) -> Result<Option<PrefValue>>;

    /// Write all entries in one operation
    fn write_batch(&self, entries: &[PreferenceEntry]) -> Result<()>;

    /// Remove a physical key, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool>;

    /// Make written entries durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Default-degrading reader over a preference store
#[derive(Clone, Copy)]
pub struct Preferences<'a> {
    store: &'a dyn PreferenceStore,
}

impl<'a> Preferences<'a> {
    /// Wrap a store
    pub fn new(store: &'a dyn PreferenceStore) -> Self {
        Self { store }
    }

    /// Look up a logical setting across its physical keys
    ///
    /// Keys are tried in priority order. The first entry whose value
    /// converts with `extract` wins; mismatched entries are skipped.
    pub fn lookup<T>(&self, key: &SettingKey, extract: impl Fn(&PrefValue) -> Option<T>) -> Option<T> {
        for physical in key.physical_keys() {
            match self.store.get(physical) {
                Ok(Some(value)) => match extract(&value) {
                    Some(converted) => return Some(converted),
                    None => tracing::warn!(
                        key = physical,
                        found = ?value.kind(),
                        "ignoring preference with unexpected type"
                    ),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!(key = physical, "preference read failed: {}", e),
            }
        }
        None
    }

    /// Read a boolean setting
    pub fn bool(&self, key: &SettingKey, default: bool) -> bool {
        self.lookup(key, PrefValue::as_bool).unwrap_or(default)
    }

    /// Read an integer setting
    pub fn int(&self, key: &SettingKey, default: i64) -> i64 {
        self.lookup(key, PrefValue::as_int).unwrap_or(default)
    }

    /// Read a floating-point setting
    pub fn double(&self, key: &SettingKey, default: f64) -> f64 {
        self.lookup(key, PrefValue::as_double).unwrap_or(default)
    }

    /// Read a string setting
    pub fn string(&self, key: &SettingKey, default: &str) -> String {
        self.lookup(key, |v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| default.to_string())
    }

    /// Read a string list setting
    pub fn string_list(&self, key: &SettingKey, default: &[&str]) -> Vec<String> {
        self.lookup(key, |v| v.as_string_list().map(<[String]>::to_vec))
            .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
    }
}

/// A set of writes expanded over legacy aliases
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    entries: Vec<PreferenceEntry>,
    logical: Vec<(&'static str, PrefValue)>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a logical setting to every one of its physical keys
    pub fn put(&mut self, key: &SettingKey, value: impl Into<PrefValue>) -> &mut Self {
        let value = value.into();
        for physical in key.physical_keys() {
            self.entries.push(PreferenceEntry::new(physical, value.clone()));
        }
        self.logical.push((key.name(), value));
        self
    }

    /// Physical entries, aliases included
    pub fn entries(&self) -> &[PreferenceEntry] {
        &self.entries
    }

    /// Canonical name and value of each logical setting, aliases excluded
    pub fn logical(&self) -> &[(&'static str, PrefValue)] {
        &self.logical
    }

    /// Canonical values as a JSON object
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.logical
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.to_json()))
            .collect()
    }

    /// Number of physical entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the batch to a store
    pub fn apply(&self, store: &dyn PreferenceStore) -> Result<()> {
        store.write_batch(&self.entries)
    }
}

/// In-memory preference store
///
/// Used where no persistent location is configured and in tests. Counts
/// batch writes and flushes and can be told to reject writes.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    data: RwLock<HashMap<String, PrefValue>>,
    batches: AtomicUsize,
    flushes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryPreferenceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw entries
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PrefValue)>,
        K: Into<String>,
    {
        let store = Self::new();
        {
            let mut data = store.data.write();
            for (key, value) in entries {
                data.insert(key.into(), value);
            }
        }
        store
    }

    /// Number of batches written so far
    pub fn write_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Number of flushes so far
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail with [`StoreError::Unavailable`]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a raw entry
    pub fn raw(&self, key: &str) -> Option<PrefValue> {
        self.data.read().get(key).cloned()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<PrefValue>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write_batch(&self, entries: &[PreferenceEntry]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }

        let mut data = self.data.write();
        for entry in entries {
            data.insert(entry.key.clone(), entry.value.clone());
        }
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvStore;

    const AUTO_CORRECTION: SettingKey = SettingKey::with_aliases("auto_correction", &["autocorrect"]);
    const CLIPBOARD: SettingKey = SettingKey::with_aliases(
        "clipboard_suggestions",
        &["internal_clipboard", "clipboardSuggestions"],
    );
    const HISTORY: SettingKey = SettingKey::with_aliases("history_size", &["clipboard_history_items"]);

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<PrefValue>> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        fn write_batch(&self, _entries: &[PreferenceEntry]) -> Result<()> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<bool> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }
    }

    #[test]
    fn test_missing_key_returns_default() {
        let store = MemoryPreferenceStore::new();
        let prefs = Preferences::new(&store);

        assert!(prefs.bool(&AUTO_CORRECTION, true));
        assert_eq!(prefs.int(&HISTORY, 20), 20);
        assert_eq!(prefs.string(&SettingKey::new("selected_sound"), "default"), "default");
        assert_eq!(prefs.string_list(&SettingKey::new("langs"), &["en"]), vec!["en"]);
    }

    #[test]
    fn test_legacy_alias_is_read_when_canonical_missing() {
        let store = MemoryPreferenceStore::with_entries([("autocorrect", PrefValue::Bool(false))]);
        let prefs = Preferences::new(&store);

        assert!(!prefs.bool(&AUTO_CORRECTION, true));
    }

    #[test]
    fn test_canonical_key_has_priority() {
        let store = MemoryPreferenceStore::with_entries([
            ("internal_clipboard", PrefValue::Bool(true)),
            ("clipboardSuggestions", PrefValue::Bool(true)),
            ("clipboard_suggestions", PrefValue::Bool(false)),
        ]);
        let prefs = Preferences::new(&store);

        assert!(!prefs.bool(&CLIPBOARD, true));
    }

    #[test]
    fn test_type_mismatch_falls_through_to_next_alias() {
        let store = MemoryPreferenceStore::with_entries([
            ("history_size", PrefValue::String("lots".to_string())),
            ("clipboard_history_items", PrefValue::Int(30)),
        ]);
        let prefs = Preferences::new(&store);

        assert_eq!(prefs.int(&HISTORY, 20), 30);
    }

    #[test]
    fn test_type_mismatch_without_fallback_uses_default() {
        let store = MemoryPreferenceStore::with_entries([("auto_correction", PrefValue::Int(1))]);
        let prefs = Preferences::new(&store);

        assert!(prefs.bool(&AUTO_CORRECTION, true));
    }

    #[test]
    fn test_double_accepts_integer() {
        let store = MemoryPreferenceStore::with_entries([("volume", PrefValue::Int(1))]);
        let prefs = Preferences::new(&store);

        assert_eq!(prefs.double(&SettingKey::new("volume"), 0.5), 1.0);
    }

    #[test]
    fn test_read_errors_degrade_to_default() {
        let prefs = Preferences::new(&BrokenStore);
        assert_eq!(prefs.int(&HISTORY, 20), 20);
    }

    #[test]
    fn test_write_batch_mirrors_aliases() {
        let store = MemoryPreferenceStore::new();
        let mut batch = WriteBatch::new();
        batch.put(&AUTO_CORRECTION, false).put(&CLIPBOARD, true);
        assert_eq!(batch.len(), 5);

        batch.apply(&store).unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.raw("auto_correction"), Some(PrefValue::Bool(false)));
        assert_eq!(store.raw("autocorrect"), Some(PrefValue::Bool(false)));
        assert_eq!(store.raw("internal_clipboard"), Some(PrefValue::Bool(true)));
        assert_eq!(store.raw("clipboardSuggestions"), Some(PrefValue::Bool(true)));
    }

    #[test]
    fn test_write_batch_logical_view_excludes_aliases() {
        let mut batch = WriteBatch::new();
        batch.put(&HISTORY, 35i64);

        let json = batch.to_json();
        assert_eq!(json.len(), 1);
        assert_eq!(json["history_size"], serde_json::json!(35));
    }

    #[test]
    fn test_failed_write_reports_error() {
        let store = MemoryPreferenceStore::new();
        store.set_fail_writes(true);

        let mut batch = WriteBatch::new();
        batch.put(&AUTO_CORRECTION, true);
        assert!(matches!(batch.apply(&store), Err(StoreError::Unavailable(_))));
        assert!(store.is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_aliases_round_trip_through_sled() {
        let kv = KvStore::in_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch.put(&AUTO_CORRECTION, false);
        batch.apply(&kv).unwrap();

        let prefs = Preferences::new(&kv);
        assert!(!prefs.bool(&SettingKey::new("autocorrect"), true));
        assert!(!prefs.bool(&AUTO_CORRECTION, true));
    }

    #[test]
    fn test_untagged_json_encoding() {
        assert_eq!(serde_json::to_string(&PrefValue::Int(35)).unwrap(), "35");
        let list: PrefValue = serde_json::from_str(r#"["en","hi"]"#).unwrap();
        assert_eq!(list, PrefValue::StringList(vec!["en".into(), "hi".into()]));
        let double: PrefValue = serde_json::from_str("0.5").unwrap();
        assert_eq!(double, PrefValue::Double(0.5));
    }
}
