//! Keyboard sound settings

use app_platform::{KeyboardSound, NativeCall};
use app_state::SettingsDomain;
use storage::{Preferences, WriteBatch};

use crate::keys::sound as keys;

/// Sound used when nothing has been chosen
pub const DEFAULT_SOUND: &str = "default";

/// Key press sound selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundSettings {
    /// Sound asset name
    pub selected_sound: String,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self { selected_sound: DEFAULT_SOUND.to_string() }
    }
}

impl SettingsDomain for SoundSettings {
    const NAME: &'static str = "sound_settings";

    fn load(prefs: &Preferences<'_>) -> Self {
        let selected_sound = prefs.string(&keys::SELECTED_SOUND, DEFAULT_SOUND);
        if selected_sound.trim().is_empty() {
            return Self::default();
        }
        Self { selected_sound }
    }

    fn write(&self, batch: &mut WriteBatch) {
        batch.put(&keys::SELECTED_SOUND, self.selected_sound.as_str());
    }

    fn native_update(&self) -> Option<NativeCall> {
        Some(NativeCall::SetKeyboardSound(KeyboardSound { file: self.selected_sound.clone() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::{MemoryPreferenceStore, PrefValue};

    #[test]
    fn test_empty_store_loads_default() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(SoundSettings::load(&Preferences::new(&store)), SoundSettings::default());
    }

    #[test]
    fn test_blank_sound_falls_back_to_default() {
        let store = MemoryPreferenceStore::with_entries([("selected_sound", PrefValue::String(" ".into()))]);
        assert_eq!(SoundSettings::load(&Preferences::new(&store)).selected_sound, DEFAULT_SOUND);
    }

    #[test]
    fn test_native_call() {
        let settings = SoundSettings { selected_sound: "typewriter".into() };
        assert_eq!(
            settings.native_update(),
            Some(NativeCall::SetKeyboardSound(KeyboardSound { file: "typewriter".into() }))
        );
    }
}
