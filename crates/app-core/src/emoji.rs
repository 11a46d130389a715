//! Emoji settings

use app_platform::{EmojiSettings as EmojiPayload, NativeCall};
use app_state::SettingsDomain;
use storage::{Preferences, WriteBatch};

use crate::keys::emoji as keys;

/// Smallest allowed recent emoji capacity
pub const MIN_HISTORY_SIZE: u32 = 10;
/// Largest allowed recent emoji capacity
pub const MAX_HISTORY_SIZE: u32 = 200;

/// Skin tone modifiers accepted by the keyboard; empty means none
pub const SKIN_TONES: &[&str] = &[
    "",
    "\u{1F3FB}",
    "\u{1F3FC}",
    "\u{1F3FD}",
    "\u{1F3FE}",
    "\u{1F3FF}",
];

/// Emoji panel settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiSettings {
    /// Skin tone modifier applied to people emoji
    pub skin_tone: String,
    /// Number of recent emoji kept
    pub history_max_size: u32,
}

impl Default for EmojiSettings {
    fn default() -> Self {
        Self { skin_tone: String::new(), history_max_size: 90 }
    }
}

impl EmojiSettings {
    /// Set the recent emoji capacity, clamped to the allowed range
    pub fn set_history_max_size(&mut self, size: i64) -> u32 {
        self.history_max_size =
            size.clamp(i64::from(MIN_HISTORY_SIZE), i64::from(MAX_HISTORY_SIZE)) as u32;
        self.history_max_size
    }

    /// Set the skin tone; unknown modifiers are refused
    pub fn set_skin_tone(&mut self, tone: &str) -> Result<(), UnknownSkinTone> {
        if !SKIN_TONES.contains(&tone) {
            return Err(UnknownSkinTone(tone.to_string()));
        }
        self.skin_tone = tone.to_string();
        Ok(())
    }
}

/// A skin tone outside [`SKIN_TONES`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown skin tone: {0:?}")]
pub struct UnknownSkinTone(pub String);

impl SettingsDomain for EmojiSettings {
    const NAME: &'static str = "emoji_settings";

    fn load(prefs: &Preferences<'_>) -> Self {
        let mut settings = Self::default();
        settings.set_history_max_size(
            prefs.int(&keys::HISTORY_MAX_SIZE, i64::from(settings.history_max_size)),
        );

        let tone = prefs.string(&keys::SKIN_TONE, "");
        if settings.set_skin_tone(&tone).is_err() {
            tracing::warn!(tone = %tone, "stored skin tone not recognised, using default");
        }
        settings
    }

    fn write(&self, batch: &mut WriteBatch) {
        batch
            .put(&keys::HISTORY_MAX_SIZE, self.history_max_size)
            .put(&keys::SKIN_TONE, self.skin_tone.as_str());
    }

    fn native_update(&self) -> Option<NativeCall> {
        Some(NativeCall::UpdateEmojiSettings(EmojiPayload {
            skin_tone: self.skin_tone.clone(),
            history_max_size: self.history_max_size,
        }))
    }
}
