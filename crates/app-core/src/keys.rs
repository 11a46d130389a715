//! Preference key table
//!
//! Every logical setting the companion persists, with the legacy keys it
//! must keep readable and writable. Read priority follows alias order.

use storage::SettingKey;

/// Typing and suggestion settings
pub mod typing {
    use super::SettingKey;

    /// Show the suggestion strip
    pub const DISPLAY_SUGGESTIONS: SettingKey = SettingKey::new("display_suggestions");
    /// Suggestion strip layout
    pub const DISPLAY_MODE: SettingKey = SettingKey::with_aliases("display_mode", &["displayMode"]);
    /// Clipboard history capacity
    pub const HISTORY_SIZE: SettingKey =
        SettingKey::with_aliases("history_size", &["clipboard_history_items"]);
    /// Autocorrect
    pub const AUTO_CORRECTION: SettingKey =
        SettingKey::with_aliases("auto_correction", &["autocorrect"]);
    /// Clipboard suggestions
    pub const CLIPBOARD_SUGGESTIONS: SettingKey = SettingKey::with_aliases(
        "clipboard_suggestions",
        &["internal_clipboard", "clipboardSuggestions"],
    );
    /// Clipboard suggestion window in seconds
    pub const CLIPBOARD_WINDOW_SEC: SettingKey = SettingKey::new("clipboard_window_sec");
    /// Dictionary suggestions
    pub const DICTIONARY_ENABLED: SettingKey =
        SettingKey::with_aliases("dictionary_enabled", &["dictionaryEnabled"]);
    /// Auto-fill top suggestion
    pub const AUTO_FILL_SUGGESTION: SettingKey =
        SettingKey::with_aliases("auto_fill_suggestion", &["autoFillSuggestion"]);
    /// Auto-capitalization
    pub const AUTO_CAPITALIZATION: SettingKey =
        SettingKey::with_aliases("auto_capitalization", &["autoCapitalization"]);
    /// Remember caps lock
    pub const REMEMBER_CAPS_STATE: SettingKey = SettingKey::new("remember_caps_state");
    /// Double space inserts a period
    pub const DOUBLE_SPACE_PERIOD: SettingKey =
        SettingKey::with_aliases("double_space_period", &["doubleSpacePeriod"]);

    /// All typing keys
    pub const ALL: &[SettingKey] = &[
        DISPLAY_SUGGESTIONS,
        DISPLAY_MODE,
        HISTORY_SIZE,
        AUTO_CORRECTION,
        CLIPBOARD_SUGGESTIONS,
        CLIPBOARD_WINDOW_SEC,
        DICTIONARY_ENABLED,
        AUTO_FILL_SUGGESTION,
        AUTO_CAPITALIZATION,
        REMEMBER_CAPS_STATE,
        DOUBLE_SPACE_PERIOD,
    ];
}

/// Emoji settings
pub mod emoji {
    use super::SettingKey;

    /// Recent emoji capacity
    pub const HISTORY_MAX_SIZE: SettingKey = SettingKey::new("emoji_history_max_size");
    /// Skin tone modifier
    pub const SKIN_TONE: SettingKey = SettingKey::new("emoji_skin_tone");

    /// All emoji keys
    pub const ALL: &[SettingKey] = &[HISTORY_MAX_SIZE, SKIN_TONE];
}

/// Keyboard sound settings
pub mod sound {
    use super::SettingKey;

    /// Key press sound
    pub const SELECTED_SOUND: SettingKey = SettingKey::new("selected_sound");

    /// All sound keys
    pub const ALL: &[SettingKey] = &[SELECTED_SOUND];
}

/// Language settings
pub mod language {
    use super::SettingKey;

    /// Enabled languages, default first
    pub const ENABLED_LANGUAGES: SettingKey = SettingKey::new("flutter.enabled_languages");
    /// Default language
    pub const DEFAULT_LANGUAGE: SettingKey = SettingKey::new("flutter.default_language");
    /// Active language
    pub const CURRENT_LANGUAGE: SettingKey = SettingKey::new("flutter.current_language");
    /// Multilingual typing
    pub const MULTILINGUAL_ENABLED: SettingKey = SettingKey::new("flutter.multilingual_enabled");

    /// All language keys
    pub const ALL: &[SettingKey] =
        &[ENABLED_LANGUAGES, DEFAULT_LANGUAGE, CURRENT_LANGUAGE, MULTILINGUAL_ENABLED];
}
