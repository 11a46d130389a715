//! Native keyboard bridge for the keyboard companion
//!
//! This crate defines the typed call boundary to the platform keyboard
//! service: outbound method calls, inbound events, and a channel-backed
//! transport that carries them as method name plus JSON arguments.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod channel;

pub use bridge::{
    BridgeError, DownloadProgress, DownloadStatus, EmojiSettings, EnabledLanguages,
    KeyboardSettings, KeyboardSound, LanguageDownloadRequest, MethodCall, NativeBridge,
    NativeCall, NativeEvent,
};
pub use channel::{ChannelBridge, PendingCall, PlatformEndpoint};
