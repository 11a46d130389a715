//! Language pack downloads
//!
//! Downloads run on the keyboard service; progress comes back as
//! `languageDownloadProgress` events. Each download is tracked by
//! language code until it reaches a terminal status, kept around briefly
//! so the UI can show the outcome, and then dropped.
//!
//! A failed download still enables the language (offline), so the user
//! is never blocked by a missing pack.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use app_platform::{DownloadProgress, DownloadStatus, LanguageDownloadRequest, NativeCall, NativeEvent};
use app_state::{ControllerError, ControllerState, Feedback, SettingsController};

use crate::languages::{LanguageError, LanguageSettings};

/// Language pack errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguagePackError {
    /// Language selection refused the change
    #[error(transparent)]
    Language(#[from] LanguageError),

    /// Controller refused the change
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Tracked state of one download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadState {
    /// Language code
    pub lang: String,
    /// Percentage, 0 to 100
    pub progress: u8,
    /// Current status
    pub status: DownloadStatus,
    /// Failure description, if any
    pub error: Option<String>,
    #[serde(skip)]
    generation: u64,
}

impl DownloadState {
    /// Whether the download is still running
    pub fn in_progress(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// How long finished downloads stay visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionConfig {
    /// After `completed` or `offline_enabled`
    pub completed: Duration,
    /// After `error`
    pub error: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { completed: Duration::from_secs(1), error: Duration::from_secs(3) }
    }
}

/// Download states keyed by language code
#[derive(Debug, Default)]
pub struct DownloadTracker {
    entries: Mutex<HashMap<String, DownloadState>>,
    generation: AtomicU64,
}

impl DownloadTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Begin tracking a download in the `starting` state
    ///
    /// Returns `None` if a download for `lang` is already running.
    pub fn start(&self, lang: &str) -> Option<DownloadState> {
        let mut entries = self.entries.lock();
        if entries.get(lang).is_some_and(DownloadState::in_progress) {
            return None;
        }

        let state = DownloadState {
            lang: lang.to_string(),
            progress: 0,
            status: DownloadStatus::Starting,
            error: None,
            generation: self.next_generation(),
        };
        entries.insert(lang.to_string(), state.clone());
        Some(state)
    }

    /// Apply a progress report
    ///
    /// Reports for unknown languages start tracking them. Reports for a
    /// download that already finished are ignored and return `None`.
    pub fn apply(&self, report: &DownloadProgress) -> Option<DownloadState> {
        let mut entries = self.entries.lock();
        if entries.get(&report.lang).is_some_and(|s| !s.in_progress()) {
            tracing::debug!(lang = %report.lang, status = %report.status, "ignoring report for finished download");
            return None;
        }

        let generation = match entries.get(&report.lang) {
            Some(existing) => existing.generation,
            None => self.next_generation(),
        };
        let state = DownloadState {
            lang: report.lang.clone(),
            progress: report.progress,
            status: report.status,
            error: report.error.clone(),
            generation,
        };
        entries.insert(report.lang.clone(), state.clone());
        Some(state)
    }

    /// Mark a running download as failed
    pub fn fail(&self, lang: &str, error: Option<String>) -> Option<DownloadState> {
        let mut entries = self.entries.lock();
        let state = entries.get_mut(lang)?;
        state.status = DownloadStatus::Error;
        state.error = error;
        Some(state.clone())
    }

    /// Current state of one download
    pub fn get(&self, lang: &str) -> Option<DownloadState> {
        self.entries.lock().get(lang).cloned()
    }

    /// All tracked downloads, sorted by language code
    pub fn snapshot(&self) -> Vec<DownloadState> {
        let mut states: Vec<_> = self.entries.lock().values().cloned().collect();
        states.sort_by(|a, b| a.lang.cmp(&b.lang));
        states
    }

    /// Stop tracking `lang` unless a newer download replaced the entry
    pub fn remove_if_current(&self, lang: &str, generation: u64) -> bool {
        let mut entries = self.entries.lock();
        if entries.get(lang).is_some_and(|s| s.generation == generation) {
            entries.remove(lang);
            return true;
        }
        false
    }

    /// Number of tracked downloads
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Language screen controller: selection plus pack downloads
pub struct LanguagePackController {
    languages: SettingsController<LanguageSettings>,
    tracker: Arc<DownloadTracker>,
    retention: RetentionConfig,
}

impl LanguagePackController {
    /// Create a controller around a language settings controller
    pub fn new(languages: SettingsController<LanguageSettings>, retention: RetentionConfig) -> Self {
        Self { languages, tracker: Arc::new(DownloadTracker::new()), retention }
    }

    /// The underlying language settings controller
    pub fn languages(&self) -> &SettingsController<LanguageSettings> {
        &self.languages
    }

    /// Tracked downloads
    pub fn downloads(&self) -> Vec<DownloadState> {
        self.tracker.snapshot()
    }

    /// State of one download
    pub fn download(&self, lang: &str) -> Option<DownloadState> {
        self.tracker.get(lang)
    }

    /// Disable a language; refused if it is the last one
    pub fn remove_language(&self, code: &str) -> Result<(), LanguagePackError> {
        self.languages.try_update(|s| s.remove(code))?;
        Ok(())
    }

    /// Ask the keyboard service to download a language pack
    ///
    /// Returns `Ok(false)` if a download for the language is already
    /// running. A bridge failure is handled like a failed download.
    /// Refused until language settings have loaded.
    pub async fn start_download(&self, code: &str) -> Result<bool, LanguagePackError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(LanguageError::InvalidCode(code.to_string()).into());
        }
        match self.languages.state() {
            ControllerState::Loading => return Err(ControllerError::NotReady.into()),
            ControllerState::Disposed => return Err(ControllerError::Disposed.into()),
            ControllerState::Ready | ControllerState::Flushing => {}
        }
        let Some(state) = self.tracker.start(code) else {
            tracing::debug!(lang = code, "download already running");
            return Ok(false);
        };

        tracing::info!(lang = code, "starting language pack download");
        let request = NativeCall::DownloadLanguageData(LanguageDownloadRequest { lang: code.to_string() });
        if let Err(e) = self.languages.deps().bridge.invoke(request).await {
            tracing::warn!(lang = code, "language download request failed: {}", e);
            if let Some(failed) = self.tracker.fail(code, Some(e.to_string())) {
                self.finish_failed(&failed);
            } else {
                self.finish_failed(&DownloadState {
                    error: Some(e.to_string()),
                    status: DownloadStatus::Error,
                    ..state
                });
            }
        }
        Ok(true)
    }

    /// Handle a progress report from the keyboard service
    pub async fn handle_progress(&self, report: DownloadProgress) {
        let Some(state) = self.tracker.apply(&report) else {
            return;
        };

        match state.status {
            DownloadStatus::Starting | DownloadStatus::Downloading => {
                tracing::trace!(lang = %state.lang, progress = state.progress, "language download progress");
            }
            DownloadStatus::Completed | DownloadStatus::OfflineEnabled => {
                self.finish_succeeded(&state).await;
            }
            DownloadStatus::Error => self.finish_failed(&state),
        }
    }

    /// Feed inbound events to this controller until the stream closes
    pub fn spawn_event_loop(self: Arc<Self>, mut events: mpsc::Receiver<NativeEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    NativeEvent::LanguageDownloadProgress(report) => self.handle_progress(report).await,
                }
            }
            tracing::debug!("native event stream closed");
        })
    }

    fn enable_language(&self, code: &str) {
        if let Err(e) = self.languages.try_update(|s| s.add(code)) {
            tracing::warn!(lang = code, "could not enable downloaded language: {}", e);
        }
    }

    async fn finish_succeeded(&self, state: &DownloadState) {
        tracing::info!(lang = %state.lang, status = %state.status, "language pack ready");
        self.enable_language(&state.lang);
        self.languages
            .deps()
            .publish(Feedback::DownloadCompleted { lang: state.lang.clone() });

        if let Err(e) = self.languages.deps().bridge.invoke(NativeCall::BroadcastSettingsChanged).await {
            tracing::warn!(lang = %state.lang, "settings broadcast failed: {}", e);
        }

        self.schedule_removal(state, self.retention.completed);
    }

    fn finish_failed(&self, state: &DownloadState) {
        tracing::warn!(lang = %state.lang, error = ?state.error, "language pack download failed, enabling offline");
        self.enable_language(&state.lang);
        self.languages.deps().publish(Feedback::DownloadFailed {
            lang: state.lang.clone(),
            error: state.error.clone(),
        });

        self.schedule_removal(state, self.retention.error);
    }

    fn schedule_removal(&self, state: &DownloadState, after: Duration) {
        let tracker = Arc::clone(&self.tracker);
        let lang = state.lang.clone();
        let generation = state.generation;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if tracker.remove_if_current(&lang, generation) {
                tracing::trace!(lang = %lang, "download entry cleared");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(lang: &str, progress: u8, status: DownloadStatus) -> DownloadProgress {
        DownloadProgress { lang: lang.to_string(), progress, status, error: None }
    }

    #[test]
    fn test_start_rejects_running_download() {
        let tracker = DownloadTracker::new();
        let state = tracker.start("hi").unwrap();
        assert_eq!(state.status, DownloadStatus::Starting);
        assert_eq!(state.progress, 0);
        assert!(tracker.start("hi").is_none());
    }

    #[test]
    fn test_apply_updates_progress() {
        let tracker = DownloadTracker::new();
        tracker.start("hi");
        let state = tracker.apply(&report("hi", 40, DownloadStatus::Downloading)).unwrap();
        assert_eq!(state.progress, 40);
        assert!(state.in_progress());
    }

    #[test]
    fn test_apply_tracks_unknown_language() {
        let tracker = DownloadTracker::new();
        assert!(tracker.apply(&report("fr", 10, DownloadStatus::Downloading)).is_some());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_reports_after_terminal_status_are_ignored() {
        let tracker = DownloadTracker::new();
        tracker.start("hi");
        tracker.apply(&report("hi", 100, DownloadStatus::Completed)).unwrap();
        assert!(tracker.apply(&report("hi", 100, DownloadStatus::Completed)).is_none());
    }

    #[test]
    fn test_restart_after_finish_gets_new_generation() {
        let tracker = DownloadTracker::new();
        let first = tracker.start("hi").unwrap();
        tracker.apply(&report("hi", 0, DownloadStatus::Error)).unwrap();

        let second = tracker.start("hi").unwrap();
        assert!(!tracker.remove_if_current("hi", first.generation));
        assert!(tracker.remove_if_current("hi", second.generation));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_snapshot_sorted() {
        let tracker = DownloadTracker::new();
        tracker.start("hi");
        tracker.start("de");
        let langs: Vec<_> = tracker.snapshot().into_iter().map(|s| s.lang).collect();
        assert_eq!(langs, vec!["de", "hi"]);
    }

    #[test]
    fn test_state_serializes_for_display() {
        let tracker = DownloadTracker::new();
        let state = tracker.start("hi").unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json, serde_json::json!({
            "lang": "hi",
            "progress": 0,
            "status": "starting",
            "error": null,
        }));
    }
}
