//! Typing and suggestion settings
//!
//! The largest settings domain: suggestion strip, autocorrect, clipboard
//! suggestions and capitalization behaviour. Two values come from
//! sliders and are snapped to their step before they are stored.

use app_platform::{KeyboardSettings, NativeCall};
use app_state::SettingsDomain;
use storage::{Preferences, WriteBatch};

use crate::keys::typing as keys;

/// Bounds and step of an integer slider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderRange {
    /// Smallest value
    pub min: u32,
    /// Largest value
    pub max: u32,
    /// Step between values
    pub step: u32,
}

impl SliderRange {
    /// Snap a raw slider position to the nearest step within bounds
    pub fn snap(&self, value: f64) -> u32 {
        round_to_step(value, self.min, self.max, self.step)
    }
}

/// Clipboard history slider
pub const HISTORY_SIZE_RANGE: SliderRange = SliderRange { min: 10, max: 50, step: 5 };

/// Clipboard suggestion window slider, in seconds
pub const CLIPBOARD_WINDOW_RANGE: SliderRange = SliderRange { min: 0, max: 300, step: 10 };

/// Round to the nearest multiple of `step` (halves round up), then clamp
pub fn round_to_step(value: f64, min: u32, max: u32, step: u32) -> u32 {
    if !value.is_finite() {
        return min;
    }
    let step = f64::from(step.max(1));
    let snapped = (value / step).round() * step;
    snapped.clamp(f64::from(min), f64::from(max)) as u32
}

/// Human-readable clipboard window: whole minutes as `"3m"`, else `"190s"`
pub fn format_window(secs: u32) -> String {
    if secs > 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

/// Typing and suggestion settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSettings {
    /// Show the suggestion strip
    pub display_suggestions: bool,
    /// Suggestion strip layout
    pub display_mode: String,
    /// Clipboard history capacity
    pub history_size: u32,
    /// Autocorrect
    pub auto_correction: bool,
    /// Clipboard suggestions
    pub clipboard_suggestions: bool,
    /// Clipboard suggestion window in seconds
    pub clipboard_window_sec: u32,
    /// Dictionary suggestions
    pub dictionary_enabled: bool,
    /// Auto-fill top suggestion
    pub auto_fill_suggestion: bool,
    /// Auto-capitalization
    pub auto_capitalization: bool,
    /// Remember caps lock
    pub remember_caps_state: bool,
    /// Double space inserts a period
    pub double_space_period: bool,
}

impl Default for TypingSettings {
    fn default() -> Self {
        Self {
            display_suggestions: true,
            display_mode: "3".to_string(),
            history_size: 20,
            auto_correction: true,
            clipboard_suggestions: true,
            clipboard_window_sec: 60,
            dictionary_enabled: true,
            auto_fill_suggestion: true,
            auto_capitalization: true,
            remember_caps_state: false,
            double_space_period: true,
        }
    }
}

impl TypingSettings {
    /// Set clipboard history size from a slider position
    pub fn set_history_size(&mut self, raw: f64) -> u32 {
        self.history_size = HISTORY_SIZE_RANGE.snap(raw);
        self.history_size
    }

    /// Set clipboard window from a slider position
    pub fn set_clipboard_window(&mut self, raw: f64) -> u32 {
        self.clipboard_window_sec = CLIPBOARD_WINDOW_RANGE.snap(raw);
        self.clipboard_window_sec
    }

    /// Clipboard window label for display
    pub fn clipboard_window_label(&self) -> String {
        format_window(self.clipboard_window_sec)
    }

    /// Payload for `updateSettings`
    pub fn to_payload(&self) -> KeyboardSettings {
        KeyboardSettings {
            display_suggestions: self.display_suggestions,
            display_mode: self.display_mode.clone(),
            history_size: self.history_size,
            auto_correction: self.auto_correction,
            clipboard_suggestions: self.clipboard_suggestions,
            clipboard_window_sec: self.clipboard_window_sec,
            dictionary_enabled: self.dictionary_enabled,
            auto_fill_suggestion: self.auto_fill_suggestion,
            auto_capitalization: self.auto_capitalization,
            remember_caps_state: self.remember_caps_state,
            double_space_period: self.double_space_period,
        }
    }
}

impl SettingsDomain for TypingSettings {
    const NAME: &'static str = "typing_settings";

    fn load(prefs: &Preferences<'_>) -> Self {
        let d = Self::default();
        Self {
            display_suggestions: prefs.bool(&keys::DISPLAY_SUGGESTIONS, d.display_suggestions),
            display_mode: prefs.string(&keys::DISPLAY_MODE, &d.display_mode),
            history_size: HISTORY_SIZE_RANGE
                .snap(prefs.int(&keys::HISTORY_SIZE, i64::from(d.history_size)) as f64),
            auto_correction: prefs.bool(&keys::AUTO_CORRECTION, d.auto_correction),
            clipboard_suggestions: prefs.bool(&keys::CLIPBOARD_SUGGESTIONS, d.clipboard_suggestions),
            clipboard_window_sec: CLIPBOARD_WINDOW_RANGE.snap(
                prefs.int(&keys::CLIPBOARD_WINDOW_SEC, i64::from(d.clipboard_window_sec)) as f64,
            ),
            dictionary_enabled: prefs.bool(&keys::DICTIONARY_ENABLED, d.dictionary_enabled),
            auto_fill_suggestion: prefs.bool(&keys::AUTO_FILL_SUGGESTION, d.auto_fill_suggestion),
            auto_capitalization: prefs.bool(&keys::AUTO_CAPITALIZATION, d.auto_capitalization),
            remember_caps_state: prefs.bool(&keys::REMEMBER_CAPS_STATE, d.remember_caps_state),
            double_space_period: prefs.bool(&keys::DOUBLE_SPACE_PERIOD, d.double_space_period),
        }
    }

    fn write(&self, batch: &mut WriteBatch) {
        batch
            .put(&keys::DISPLAY_SUGGESTIONS, self.display_suggestions)
            .put(&keys::DISPLAY_MODE, self.display_mode.as_str())
            .put(&keys::HISTORY_SIZE, self.history_size)
            .put(&keys::AUTO_CORRECTION, self.auto_correction)
            .put(&keys::CLIPBOARD_SUGGESTIONS, self.clipboard_suggestions)
            .put(&keys::CLIPBOARD_WINDOW_SEC, self.clipboard_window_sec)
            .put(&keys::DICTIONARY_ENABLED, self.dictionary_enabled)
            .put(&keys::AUTO_FILL_SUGGESTION, self.auto_fill_suggestion)
            .put(&keys::AUTO_CAPITALIZATION, self.auto_capitalization)
            .put(&keys::REMEMBER_CAPS_STATE, self.remember_caps_state)
            .put(&keys::DOUBLE_SPACE_PERIOD, self.double_space_period);
    }

    fn native_update(&self) -> Option<NativeCall> {
        Some(NativeCall::UpdateSettings(self.to_payload()))
    }
}
