//! Companion wiring
//!
//! Builds every settings controller over shared collaborators and drives
//! their lifecycle together.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use app_core::{EmojiSettings, LanguagePackController, SoundSettings, TypingSettings};
use app_platform::{ChannelBridge, NativeBridge, NativeEvent, PlatformEndpoint};
use app_state::{ControllerDeps, Feedback, SettingsController};
use i18n::LanguageCatalog;
use networking::{CloudError, CloudSyncClient, DisabledCloudSync, HttpCloudSync};
use storage::{KvConfig, KvError, KvStore, PreferenceStore};

use crate::config::{CompanionConfig, ConfigError};

/// Errors while starting the companion
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Preference store could not be opened
    #[error("Failed to open preference store: {0}")]
    Store(#[from] KvError),

    /// Cloud client could not be built
    #[error("Failed to set up cloud sync: {0}")]
    Cloud(#[from] CloudError),
}

/// Capacity of the keyboard call and event queues
const BRIDGE_QUEUE: usize = 32;

/// All settings controllers of the companion app
pub struct Companion {
    deps: ControllerDeps,
    typing: SettingsController<TypingSettings>,
    emoji: SettingsController<EmojiSettings>,
    sound: SettingsController<SoundSettings>,
    languages: Arc<LanguagePackController>,
    catalog: LanguageCatalog,
}

impl Companion {
    /// Open the companion with a channel bridge to the keyboard service
    ///
    /// Returns the keyboard side of the channel and the stream of events it
    /// emits; pass the stream to [`Companion::spawn_event_loop`].
    pub fn open(
        config: &CompanionConfig,
    ) -> Result<(Self, PlatformEndpoint, mpsc::Receiver<NativeEvent>), StartupError> {
        let (bridge, endpoint, events) = ChannelBridge::channel(BRIDGE_QUEUE, config.bridge_timeout());
        let companion = Self::open_with_bridge(config, Arc::new(bridge))?;
        Ok((companion, endpoint, events))
    }

    /// Open the configured store and cloud client over an existing bridge
    pub fn open_with_bridge(
        config: &CompanionConfig,
        bridge: Arc<dyn NativeBridge>,
    ) -> Result<Self, StartupError> {
        config.validate()?;

        let store = match &config.store_path {
            Some(path) => KvStore::new(KvConfig::new(path.to_string_lossy()))?,
            None => KvStore::in_memory()?,
        };

        let cloud: Arc<dyn CloudSyncClient> = match &config.cloud {
            Some(cloud) => Arc::new(HttpCloudSync::new(cloud.clone())?),
            None => {
                tracing::info!("cloud sync disabled");
                Arc::new(DisabledCloudSync)
            }
        };

        let deps = ControllerDeps::new(Arc::new(store), bridge, cloud);
        Ok(Self::with_deps(deps, config))
    }

    /// Build controllers over existing collaborators
    pub fn with_deps(deps: ControllerDeps, config: &CompanionConfig) -> Self {
        let debounce = config.debounce();
        let languages = SettingsController::new(deps.clone(), debounce);

        Self {
            typing: SettingsController::new(deps.clone(), debounce),
            emoji: SettingsController::new(deps.clone(), debounce),
            sound: SettingsController::new(deps.clone(), debounce),
            languages: Arc::new(LanguagePackController::new(languages, config.retention())),
            catalog: LanguageCatalog::load_or_fallback(config.catalog_path.as_deref()),
            deps,
        }
    }

    /// Typing and suggestion settings
    pub fn typing(&self) -> &SettingsController<TypingSettings> {
        &self.typing
    }

    /// Emoji settings
    pub fn emoji(&self) -> &SettingsController<EmojiSettings> {
        &self.emoji
    }

    /// Keyboard sound settings
    pub fn sound(&self) -> &SettingsController<SoundSettings> {
        &self.sound
    }

    /// Language selection and pack downloads
    pub fn languages(&self) -> &Arc<LanguagePackController> {
        &self.languages
    }

    /// Languages available to enable
    pub fn catalog(&self) -> &LanguageCatalog {
        &self.catalog
    }

    /// Local preference store
    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.deps.store
    }

    /// Subscribe to user feedback from every controller
    pub fn subscribe(&self) -> broadcast::Receiver<Feedback> {
        self.deps.feedback.subscribe()
    }

    /// Load every domain from the store
    pub async fn load_all(&self) {
        self.typing.load().await;
        self.emoji.load().await;
        self.sound.load().await;
        self.languages.languages().load().await;
        tracing::info!("settings loaded");
    }

    /// Route keyboard events to their controllers
    pub fn spawn_event_loop(&self, events: mpsc::Receiver<NativeEvent>) -> JoinHandle<()> {
        Arc::clone(&self.languages).spawn_event_loop(events)
    }

    /// Save pending edits and tear every controller down
    pub async fn shutdown(&self) {
        self.typing.dispose().await;
        self.emoji.dispose().await;
        self.sound.dispose().await;
        self.languages.languages().dispose().await;
        if let Err(e) = self.deps.store.flush() {
            tracing::warn!("preference store flush failed: {}", e);
        }
        tracing::info!("companion shut down");
    }
}
