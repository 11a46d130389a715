//! Settings controllers
//!
//! A [`SettingsController`] owns the in-memory settings of one domain and
//! drives the save pipeline: every edit arms a persistence debounce; when
//! it fires the settings are written to the preference store, pushed to
//! the keyboard service, sent to the cloud store, and finally a reload
//! notification is debounced to the keyboard.
//!
//! The three destinations are independent. A failed local write is shown
//! to the user; native and cloud failures are only logged.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

use app_platform::{NativeBridge, NativeCall};
use networking::{CloudSyncClient, SettingsDocument};
use parking_lot::Mutex;
use storage::{PreferenceStore, Preferences, WriteBatch};

use crate::debounce::Debouncer;
use crate::feedback::{Feedback, FEEDBACK_CHANNEL_CAPACITY};

/// Controller errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// Settings have not finished loading
    #[error("Settings are still loading")]
    NotReady,

    /// Controller was disposed
    #[error("Controller has been disposed")]
    Disposed,

    /// The edit broke an invariant and was not applied
    #[error("Edit rejected: {0}")]
    Rejected(String),
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Lifecycle of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Waiting for the initial store read
    Loading,
    /// Interactive
    Ready,
    /// Writing settings out
    Flushing,
    /// Torn down; edits are refused
    Disposed,
}

/// One configuration domain
///
/// Implementations describe how the domain is read from and written to
/// the preference store and what the keyboard service needs to hear.
pub trait SettingsDomain: Clone + Default + Send + Sync + 'static {
    /// Domain name, used as the cloud document name
    const NAME: &'static str;

    /// Read the domain, falling back to defaults
    fn load(prefs: &Preferences<'_>) -> Self;

    /// Add every setting to a write batch
    fn write(&self, batch: &mut WriteBatch);

    /// Call that pushes the full settings to the keyboard, if any
    fn native_update(&self) -> Option<NativeCall>;

    /// Call that tells the keyboard to reload
    fn reload_call(&self) -> NativeCall {
        NativeCall::NotifyConfigChange
    }

    /// Normalized cloud document contents
    fn cloud_settings(&self, batch: &WriteBatch) -> Map<String, Value> {
        batch.to_json()
    }
}

/// Debounce delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Delay before settings are written
    pub persist: Duration,
    /// Delay before the keyboard is told to reload
    pub notify: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { persist: Duration::from_millis(400), notify: Duration::from_millis(300) }
    }
}

/// Collaborators shared by all controllers
#[derive(Clone)]
pub struct ControllerDeps {
    /// Local preference store
    pub store: Arc<dyn PreferenceStore>,
    /// Keyboard service bridge
    pub bridge: Arc<dyn NativeBridge>,
    /// Cloud settings store
    pub cloud: Arc<dyn CloudSyncClient>,
    /// Feedback channel
    pub feedback: broadcast::Sender<Feedback>,
}

impl ControllerDeps {
    /// Bundle collaborators with a fresh feedback channel
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        bridge: Arc<dyn NativeBridge>,
        cloud: Arc<dyn CloudSyncClient>,
    ) -> Self {
        let (feedback, _) = broadcast::channel(FEEDBACK_CHANNEL_CAPACITY);
        Self { store, bridge, cloud, feedback }
    }

    /// Publish feedback, ignoring the absence of listeners
    pub fn publish(&self, feedback: Feedback) {
        let _ = self.feedback.send(feedback);
    }
}

struct Inner<D> {
    deps: ControllerDeps,
    config: DebounceConfig,
    settings: Mutex<D>,
    state: Mutex<ControllerState>,
    persist: Debouncer,
    notify: Debouncer,
}

/// Load/edit/save controller for one settings domain
pub struct SettingsController<D: SettingsDomain> {
    inner: Arc<Inner<D>>,
}

impl<D: SettingsDomain> Clone for SettingsController<D> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<D: SettingsDomain> SettingsController<D> {
    /// Create a controller holding default settings
    pub fn new(deps: ControllerDeps, config: DebounceConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                deps,
                config,
                settings: Mutex::new(D::default()),
                state: Mutex::new(ControllerState::Loading),
                persist: Debouncer::new(format!("{}:persist", D::NAME)),
                notify: Debouncer::new(format!("{}:notify", D::NAME)),
            }),
        }
    }

    /// Read settings from the store and become ready
    ///
    /// Never fails: unreadable values degrade to defaults. Calling this
    /// again after the first load returns the current settings.
    pub async fn load(&self) -> D {
        if self.state() != ControllerState::Loading {
            return self.settings();
        }

        let store = Arc::clone(&self.inner.deps.store);
        let read = tokio::task::spawn_blocking(move || D::load(&Preferences::new(store.as_ref())));
        let loaded = match read.await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(domain = D::NAME, "settings load task failed: {}", e);
                D::default()
            }
        };

        let mut state = self.inner.state.lock();
        if *state == ControllerState::Loading {
            *self.inner.settings.lock() = loaded;
            *state = ControllerState::Ready;
            tracing::debug!(domain = D::NAME, "settings loaded");
        }
        drop(state);

        self.settings()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ControllerState {
        *self.inner.state.lock()
    }

    /// Snapshot of the in-memory settings
    pub fn settings(&self) -> D {
        self.inner.settings.lock().clone()
    }

    /// Subscribe to feedback events
    pub fn subscribe(&self) -> broadcast::Receiver<Feedback> {
        self.inner.deps.feedback.subscribe()
    }

    /// Shared collaborators
    pub fn deps(&self) -> &ControllerDeps {
        &self.inner.deps
    }

    /// Whether a save is waiting for its debounce
    pub fn has_pending_save(&self) -> bool {
        self.inner.persist.is_pending()
    }

    fn ensure_editable(&self) -> Result<()> {
        match self.state() {
            ControllerState::Loading => Err(ControllerError::NotReady),
            ControllerState::Disposed => Err(ControllerError::Disposed),
            ControllerState::Ready | ControllerState::Flushing => Ok(()),
        }
    }

    /// Apply an edit and schedule a save
    pub fn update<F, R>(&self, edit: F) -> Result<R>
    where
        F: FnOnce(&mut D) -> R,
    {
        self.ensure_editable()?;
        let result = edit(&mut self.inner.settings.lock());
        self.schedule_save();
        Ok(result)
    }

    /// Apply an edit that may be refused
    ///
    /// The edit runs against a copy; if it returns an error nothing
    /// changes, no save is scheduled, and a rejection is published.
    pub fn try_update<F, R, E>(&self, edit: F) -> Result<R>
    where
        F: FnOnce(&mut D) -> std::result::Result<R, E>,
        E: std::fmt::Display,
    {
        self.ensure_editable()?;

        let mut settings = self.inner.settings.lock();
        let mut draft = settings.clone();
        match edit(&mut draft) {
            Ok(result) => {
                *settings = draft;
                drop(settings);
                self.schedule_save();
                Ok(result)
            }
            Err(e) => {
                drop(settings);
                let reason = e.to_string();
                tracing::info!(domain = D::NAME, %reason, "edit rejected");
                self.inner
                    .deps
                    .publish(Feedback::Rejected { domain: D::NAME, reason: reason.clone() });
                Err(ControllerError::Rejected(reason))
            }
        }
    }

    fn schedule_save(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner
            .persist
            .schedule(self.inner.config.persist, move || async move { flush(&inner).await });
    }

    /// Run a pending save now instead of waiting for the debounce
    pub async fn save_now(&self) {
        self.inner.persist.flush().await;
    }

    /// Tear the controller down
    ///
    /// Pending work is run, not discarded: the last edit is saved and the
    /// keyboard is notified before this returns. Later calls do nothing.
    pub async fn dispose(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state == ControllerState::Disposed {
                return;
            }
            *state = ControllerState::Disposed;
        }

        self.inner.persist.flush().await;
        self.inner.notify.flush().await;
        tracing::debug!(domain = D::NAME, "controller disposed");
    }
}

fn set_state_if<D>(inner: &Inner<D>, from: ControllerState, to: ControllerState) {
    let mut state = inner.state.lock();
    if *state == from {
        *state = to;
    }
}

async fn flush<D: SettingsDomain>(inner: &Arc<Inner<D>>) {
    set_state_if(inner, ControllerState::Ready, ControllerState::Flushing);
    let snapshot = inner.settings.lock().clone();

    let mut batch = WriteBatch::new();
    snapshot.write(&mut batch);

    match batch.apply(inner.deps.store.as_ref()) {
        Ok(()) => {
            tracing::debug!(domain = D::NAME, entries = batch.len(), "settings saved");
            inner.deps.publish(Feedback::Saved { domain: D::NAME });
        }
        Err(e) => {
            tracing::error!(domain = D::NAME, "failed to save settings: {}", e);
            inner
                .deps
                .publish(Feedback::SaveFailed { domain: D::NAME, reason: e.to_string() });
        }
    }

    if let Some(call) = snapshot.native_update() {
        let method = call.method();
        if let Err(e) = inner.deps.bridge.invoke(call).await {
            tracing::warn!(domain = D::NAME, method, "native settings update failed: {}", e);
        }
    }

    let document = SettingsDocument::new(D::NAME, snapshot.cloud_settings(&batch));
    let cloud = Arc::clone(&inner.deps.cloud);
    tokio::spawn(async move {
        if let Err(e) = cloud.upsert(document).await {
            tracing::warn!(domain = D::NAME, "cloud sync failed: {}", e);
        }
    });

    let reload = snapshot.reload_call();
    let bridge = Arc::clone(&inner.deps.bridge);
    inner.notify.schedule(inner.config.notify, move || async move {
        let method = reload.method();
        if let Err(e) = bridge.invoke(reload).await {
            tracing::warn!(domain = D::NAME, method, "keyboard reload notification failed: {}", e);
        }
    });

    set_state_if(inner, ControllerState::Flushing, ControllerState::Ready);
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_platform::{BridgeError, KeyboardSound};
    use async_trait::async_trait;
    use mockall::mock;
    use networking::CloudError;
    use storage::{MemoryPreferenceStore, PrefValue, SettingKey};

    const SOUND: SettingKey = SettingKey::with_aliases("selected_sound", &["keyboard_sound"]);
    const VOLUME: SettingKey = SettingKey::new("sound_volume");

    #[derive(Debug, Clone, PartialEq)]
    struct SoundSettings {
        file: String,
        volume: f64,
    }

    impl Default for SoundSettings {
        fn default() -> Self {
            Self { file: "default".to_string(), volume: 0.5 }
        }
    }

    impl SettingsDomain for SoundSettings {
        const NAME: &'static str = "sound_settings";

        fn load(prefs: &Preferences<'_>) -> Self {
            let defaults = Self::default();
            Self {
                file: prefs.string(&SOUND, &defaults.file),
                volume: prefs.double(&VOLUME, defaults.volume),
            }
        }

        fn write(&self, batch: &mut WriteBatch) {
            batch.put(&SOUND, self.file.as_str()).put(&VOLUME, self.volume);
        }

        fn native_update(&self) -> Option<NativeCall> {
            Some(NativeCall::SetKeyboardSound(KeyboardSound { file: self.file.clone() }))
        }
    }

    #[derive(Default)]
    struct RecordingBridge {
        calls: Mutex<Vec<NativeCall>>,
    }

    impl RecordingBridge {
        fn methods(&self) -> Vec<&'static str> {
            self.calls.lock().iter().map(NativeCall::method).collect()
        }
    }

    #[async_trait]
    impl NativeBridge for RecordingBridge {
        async fn invoke(&self, call: NativeCall) -> app_platform::bridge::Result<()> {
            self.calls.lock().push(call);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingCloud {
        documents: Mutex<Vec<SettingsDocument>>,
    }

    #[async_trait]
    impl CloudSyncClient for RecordingCloud {
        async fn upsert(&self, document: SettingsDocument) -> networking::cloud::Result<()> {
            self.documents.lock().push(document);
            Ok(())
        }
    }

    mock! {
        Bridge {}
        #[async_trait]
        impl NativeBridge for Bridge {
            async fn invoke(&self, call: NativeCall) -> app_platform::bridge::Result<()>;
        }
    }

    mock! {
        Cloud {}
        #[async_trait]
        impl CloudSyncClient for Cloud {
            async fn upsert(&self, document: SettingsDocument) -> networking::cloud::Result<()>;
        }
    }

    struct Harness {
        store: Arc<MemoryPreferenceStore>,
        bridge: Arc<RecordingBridge>,
        cloud: Arc<RecordingCloud>,
        controller: SettingsController<SoundSettings>,
    }

    fn harness_with(store: MemoryPreferenceStore) -> Harness {
        let store = Arc::new(store);
        let bridge = Arc::new(RecordingBridge::default());
        let cloud = Arc::new(RecordingCloud::default());
        let deps = ControllerDeps::new(store.clone(), bridge.clone(), cloud.clone());
        let controller = SettingsController::new(deps, DebounceConfig::default());
        Harness { store, bridge, cloud, controller }
    }

    fn harness() -> Harness {
        harness_with(MemoryPreferenceStore::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_empty_store_yields_defaults() {
        let h = harness();
        assert_eq!(h.controller.state(), ControllerState::Loading);

        let settings = h.controller.load().await;
        assert_eq!(settings, SoundSettings::default());
        assert_eq!(h.controller.state(), ControllerState::Ready);
    }

    #[derive(Default)]
    struct ThreadRecordingStore {
        inner: MemoryPreferenceStore,
        readers: Mutex<Vec<std::thread::ThreadId>>,
    }

    impl PreferenceStore for ThreadRecordingStore {
        fn get(&self, key: &str) -> storage::preferences::Result<Option<PrefValue>> {
            self.readers.lock().push(std::thread::current().id());
            self.inner.get(key)
        }

        fn write_batch(&self, entries: &[storage::PreferenceEntry]) -> storage::preferences::Result<()> {
            self.inner.write_batch(entries)
        }

        fn remove(&self, key: &str) -> storage::preferences::Result<bool> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_load_reads_store_off_the_async_thread() {
        let store = Arc::new(ThreadRecordingStore::default());
        let deps = ControllerDeps::new(
            store.clone(),
            Arc::new(RecordingBridge::default()),
            Arc::new(RecordingCloud::default()),
        );
        let controller: SettingsController<SoundSettings> =
            SettingsController::new(deps, DebounceConfig::default());

        controller.load().await;

        let readers = store.readers.lock();
        assert!(!readers.is_empty());
        assert!(readers.iter().all(|id| *id != std::thread::current().id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_reads_legacy_key() {
        let h = harness_with(MemoryPreferenceStore::with_entries([(
            "keyboard_sound",
            PrefValue::String("typewriter".into()),
        )]));

        let settings = h.controller.load().await;
        assert_eq!(settings.file, "typewriter");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_before_load_is_refused() {
        let h = harness();
        assert_eq!(
            h.controller.update(|s| s.file = "x".into()),
            Err(ControllerError::NotReady)
        );
        assert_eq!(h.controller.settings(), SoundSettings::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce_into_one_save() {
        let h = harness();
        h.controller.load().await;

        for step in 1..=8 {
            h.controller.update(|s| s.volume = f64::from(step) / 10.0).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(h.store.write_count(), 0);
        assert!(h.controller.has_pending_save());

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(h.store.write_count(), 1);
        assert_eq!(h.store.raw("sound_volume"), Some(PrefValue::Double(0.8)));
        assert_eq!(h.bridge.methods(), vec!["setKeyboardSound", "notifyConfigChange"]);
        assert_eq!(h.cloud.documents.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_writes_aliases_and_normalized_document() {
        let h = harness();
        h.controller.load().await;

        h.controller.update(|s| s.file = "typewriter".into()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(h.store.raw("selected_sound"), Some(PrefValue::String("typewriter".into())));
        assert_eq!(h.store.raw("keyboard_sound"), Some(PrefValue::String("typewriter".into())));

        let documents = h.cloud.documents.lock();
        let document = &documents[0];
        assert_eq!(document.name, "sound_settings");
        assert_eq!(document.settings["selected_sound"], "typewriter");
        assert!(!document.settings.contains_key("keyboard_sound"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_flushes_pending_edit() {
        let h = harness();
        h.controller.load().await;

        h.controller.update(|s| s.file = "pop".into()).unwrap();
        h.controller.dispose().await;

        assert_eq!(h.store.write_count(), 1);
        assert_eq!(h.store.raw("selected_sound"), Some(PrefValue::String("pop".into())));
        assert_eq!(h.bridge.methods(), vec!["setKeyboardSound", "notifyConfigChange"]);
        assert_eq!(h.controller.state(), ControllerState::Disposed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_is_idempotent_and_blocks_edits() {
        let h = harness();
        h.controller.load().await;
        h.controller.dispose().await;
        h.controller.dispose().await;

        assert_eq!(h.store.write_count(), 0);
        assert_eq!(h.controller.update(|s| s.volume = 1.0), Err(ControllerError::Disposed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_edit_changes_nothing() {
        let h = harness();
        h.controller.load().await;
        let mut feedback = h.controller.subscribe();

        let result = h.controller.try_update(|s| {
            s.file = "changed".into();
            Err::<(), _>("sound file missing")
        });

        assert_eq!(result, Err(ControllerError::Rejected("sound file missing".into())));
        assert_eq!(h.controller.settings(), SoundSettings::default());
        assert!(!h.controller.has_pending_save());
        assert_eq!(
            feedback.recv().await.unwrap(),
            Feedback::Rejected { domain: "sound_settings", reason: "sound file missing".into() }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_surfaces_and_other_destinations_continue() {
        let h = harness();
        h.controller.load().await;
        h.store.set_fail_writes(true);
        let mut feedback = h.controller.subscribe();

        h.controller.update(|s| s.file = "pop".into()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(matches!(feedback.recv().await.unwrap(), Feedback::SaveFailed { .. }));
        assert_eq!(h.controller.settings().file, "pop");
        assert_eq!(h.bridge.methods(), vec!["setKeyboardSound", "notifyConfigChange"]);
        assert_eq!(h.cloud.documents.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_native_and_cloud_failures_do_not_block_local_save() {
        let store = Arc::new(MemoryPreferenceStore::new());

        let mut bridge = MockBridge::new();
        bridge
            .expect_invoke()
            .times(2)
            .returning(|_| Err(BridgeError::Unavailable("keyboard not running".into())));

        let mut cloud = MockCloud::new();
        cloud.expect_upsert().times(1).returning(|_| {
            Err(CloudError::InvalidConfig("offline".into()))
        });

        let deps = ControllerDeps::new(store.clone(), Arc::new(bridge), Arc::new(cloud));
        let controller: SettingsController<SoundSettings> =
            SettingsController::new(deps, DebounceConfig::default());
        controller.load().await;
        let mut feedback = controller.subscribe();

        controller.update(|s| s.file = "pop".into()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(store.write_count(), 1);
        assert_eq!(feedback.recv().await.unwrap(), Feedback::Saved { domain: "sound_settings" });
        assert_eq!(controller.state(), ControllerState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_skips_debounce() {
        let h = harness();
        h.controller.load().await;

        h.controller.update(|s| s.volume = 0.9).unwrap();
        h.controller.save_now().await;

        assert_eq!(h.store.write_count(), 1);
        assert!(!h.controller.has_pending_save());
    }
}
