//! Native bridge contract
//!
//! Every method the companion can invoke on the keyboard service has a
//! typed request here, and every event the service pushes back has a typed
//! form. Conversion to and from the untyped [`MethodCall`] wire shape
//! happens once, at this boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Native bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The native side is not reachable
    #[error("Native side unavailable: {0}")]
    Unavailable(String),

    /// The native side reported a failure
    #[error("Native call {method} failed: {message}")]
    CallFailed {
        /// Method that failed
        method: String,
        /// Failure reported by the native side
        message: String,
    },

    /// The native side did not answer in time
    #[error("Native call {0} timed out")]
    Timeout(String),

    /// Payload could not be encoded or decoded
    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Method name not part of the contract
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// Argument outside its allowed values
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Untyped method call as carried over the platform channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Method name
    pub method: String,
    /// JSON arguments (`null` when the method takes none)
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    /// Create a new method call
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self { method: method.into(), arguments }
    }
}

/// Typing and suggestion settings sent with `updateSettings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardSettings {
    /// Show the suggestion strip
    pub display_suggestions: bool,
    /// Suggestion strip layout
    pub display_mode: String,
    /// Clipboard history capacity
    pub history_size: u32,
    /// Automatically correct typos
    pub auto_correction: bool,
    /// Offer recent clipboard items as suggestions
    pub clipboard_suggestions: bool,
    /// How long a copied item stays suggestable, in seconds
    pub clipboard_window_sec: u32,
    /// Use the dictionary for suggestions
    pub dictionary_enabled: bool,
    /// Fill in the top suggestion automatically
    pub auto_fill_suggestion: bool,
    /// Capitalize sentence starts
    pub auto_capitalization: bool,
    /// Keep caps lock between sessions
    pub remember_caps_state: bool,
    /// Double space inserts a period
    pub double_space_period: bool,
}

/// Arguments of `setEnabledLanguages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledLanguages {
    /// Enabled language codes, default first
    pub enabled: Vec<String>,
    /// Language currently active on the keyboard
    pub current: String,
}

/// Arguments of `downloadLanguageData`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDownloadRequest {
    /// Language code to download
    pub lang: String,
}

/// Arguments of `setKeyboardSound`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardSound {
    /// Sound asset name
    pub file: String,
}

/// Arguments of `updateEmojiSettings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmojiSettings {
    /// Skin tone modifier (empty for none)
    pub skin_tone: String,
    /// Number of recent emoji kept
    pub history_max_size: u32,
}

/// An outbound call to the keyboard service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    /// Replace typing and suggestion settings
    UpdateSettings(KeyboardSettings),
    /// Ask the keyboard to reload its configuration
    NotifyConfigChange,
    /// Broadcast that stored settings changed
    BroadcastSettingsChanged,
    /// Replace the enabled language list
    SetEnabledLanguages(EnabledLanguages),
    /// Start downloading a language pack
    DownloadLanguageData(LanguageDownloadRequest),
    /// Select the key press sound
    SetKeyboardSound(KeyboardSound),
    /// Replace emoji settings
    UpdateEmojiSettings(EmojiSettings),
}

impl NativeCall {
    /// Wire method name
    pub fn method(&self) -> &'static str {
        match self {
            NativeCall::UpdateSettings(_) => "updateSettings",
            NativeCall::NotifyConfigChange => "notifyConfigChange",
            NativeCall::BroadcastSettingsChanged => "broadcastSettingsChanged",
            NativeCall::SetEnabledLanguages(_) => "setEnabledLanguages",
            NativeCall::DownloadLanguageData(_) => "downloadLanguageData",
            NativeCall::SetKeyboardSound(_) => "setKeyboardSound",
            NativeCall::UpdateEmojiSettings(_) => "updateEmojiSettings",
        }
    }

    /// Encode into the wire shape
    pub fn to_method_call(&self) -> Result<MethodCall> {
        let arguments = match self {
            NativeCall::UpdateSettings(settings) => serde_json::to_value(settings)?,
            NativeCall::NotifyConfigChange | NativeCall::BroadcastSettingsChanged => Value::Null,
            NativeCall::SetEnabledLanguages(languages) => serde_json::to_value(languages)?,
            NativeCall::DownloadLanguageData(request) => serde_json::to_value(request)?,
            NativeCall::SetKeyboardSound(sound) => serde_json::to_value(sound)?,
            NativeCall::UpdateEmojiSettings(emoji) => serde_json::to_value(emoji)?,
        };
        Ok(MethodCall::new(self.method(), arguments))
    }

    /// Decode from the wire shape
    pub fn from_method_call(call: &MethodCall) -> Result<Self> {
        let args = || call.arguments.clone();
        Ok(match call.method.as_str() {
            "updateSettings" => NativeCall::UpdateSettings(serde_json::from_value(args())?),
            "notifyConfigChange" => NativeCall::NotifyConfigChange,
            "broadcastSettingsChanged" => NativeCall::BroadcastSettingsChanged,
            "setEnabledLanguages" => NativeCall::SetEnabledLanguages(serde_json::from_value(args())?),
            "downloadLanguageData" => {
                NativeCall::DownloadLanguageData(serde_json::from_value(args())?)
            }
            "setKeyboardSound" => NativeCall::SetKeyboardSound(serde_json::from_value(args())?),
            "updateEmojiSettings" => NativeCall::UpdateEmojiSettings(serde_json::from_value(args())?),
            other => return Err(BridgeError::UnknownMethod(other.to_string())),
        })
    }
}

/// Language pack download status reported by the keyboard service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Download requested, nothing received yet
    Starting,
    /// Data is arriving
    Downloading,
    /// Pack installed
    Completed,
    /// Pack unavailable, language enabled without it
    OfflineEnabled,
    /// Download failed
    Error,
}

impl DownloadStatus {
    /// Whether no further progress will arrive
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed | DownloadStatus::OfflineEnabled | DownloadStatus::Error
        )
    }

    /// Whether the language is usable afterwards
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::OfflineEnabled)
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Starting => "starting",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Completed => "completed",
            DownloadStatus::OfflineEnabled => "offline_enabled",
            DownloadStatus::Error => "error",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadStatus {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "starting" => Ok(DownloadStatus::Starting),
            "downloading" => Ok(DownloadStatus::Downloading),
            "completed" => Ok(DownloadStatus::Completed),
            "offline_enabled" => Ok(DownloadStatus::OfflineEnabled),
            "error" | "failed" => Ok(DownloadStatus::Error),
            other => Err(BridgeError::InvalidArgument(format!("download status {other:?}"))),
        }
    }
}

/// Progress of a language pack download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Language code
    pub lang: String,
    /// Percentage, 0 to 100
    pub progress: u8,
    /// Current status
    pub status: DownloadStatus,
    /// Failure description, if any
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct RawDownloadProgress {
    lang: String,
    #[serde(default)]
    progress: f64,
    status: String,
    #[serde(default)]
    error: Option<String>,
}

impl DownloadProgress {
    fn from_arguments(arguments: Value) -> Result<Self> {
        let raw: RawDownloadProgress = serde_json::from_value(arguments)?;
        if raw.lang.trim().is_empty() {
            return Err(BridgeError::InvalidArgument("empty language code".to_string()));
        }

        let progress = if raw.progress.is_finite() {
            raw.progress.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };

        Ok(Self {
            lang: raw.lang,
            progress,
            status: raw.status.parse()?,
            error: raw.error.filter(|e| !e.is_empty()),
        })
    }
}

/// An inbound event pushed by the keyboard service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    /// `languageDownloadProgress`
    LanguageDownloadProgress(DownloadProgress),
}

impl NativeEvent {
    /// Decode from the wire shape
    pub fn from_method_call(call: &MethodCall) -> Result<Self> {
        match call.method.as_str() {
            "languageDownloadProgress" => Ok(NativeEvent::LanguageDownloadProgress(
                DownloadProgress::from_arguments(call.arguments.clone())?,
            )),
            other => Err(BridgeError::UnknownMethod(other.to_string())),
        }
    }
}

/// Call boundary to the platform keyboard service
///
/// Calls are request/response; the response carries no data beyond
/// success or failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Invoke a method on the keyboard service
    async fn invoke(&self, call: NativeCall) -> Result<()>;
}
