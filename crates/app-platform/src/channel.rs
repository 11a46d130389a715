//! Channel-backed platform transport
//!
//! [`ChannelBridge`] is the application side of a method channel: calls
//! are encoded to [`MethodCall`] and queued for the platform side, which
//! answers each one through [`PendingCall`]. Events pushed by the
//! platform are validated on the way in and delivered as [`NativeEvent`]s.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::bridge::{BridgeError, MethodCall, NativeBridge, NativeCall, NativeEvent, Result};

type Reply = std::result::Result<Value, String>;

/// A call waiting for the platform side to answer
pub struct PendingCall {
    call: MethodCall,
    reply: oneshot::Sender<Reply>,
}

impl PendingCall {
    /// The call being made
    pub fn call(&self) -> &MethodCall {
        &self.call
    }

    /// Answer with success
    pub fn respond_ok(self, value: Value) {
        let _ = self.reply.send(Ok(value));
    }

    /// Answer with a failure message
    pub fn respond_err(self, message: impl Into<String>) {
        let _ = self.reply.send(Err(message.into()));
    }
}

/// Application side of the method channel
#[derive(Clone)]
pub struct ChannelBridge {
    calls: mpsc::Sender<PendingCall>,
    timeout: Duration,
}

/// Platform side of the method channel
pub struct PlatformEndpoint {
    calls: mpsc::Receiver<PendingCall>,
    events: mpsc::Sender<NativeEvent>,
}

impl ChannelBridge {
    /// Create a connected bridge, platform endpoint, and event stream
    ///
    /// # Arguments
    ///
    /// * `buffer` - Capacity of the call and event queues
    /// * `timeout` - How long to wait for the platform to answer a call
    pub fn channel(
        buffer: usize,
        timeout: Duration,
    ) -> (ChannelBridge, PlatformEndpoint, mpsc::Receiver<NativeEvent>) {
        let (call_tx, call_rx) = mpsc::channel(buffer);
        let (event_tx, event_rx) = mpsc::channel(buffer);

        (
            ChannelBridge { calls: call_tx, timeout },
            PlatformEndpoint { calls: call_rx, events: event_tx },
            event_rx,
        )
    }
}

#[async_trait]
impl NativeBridge for ChannelBridge {
    async fn invoke(&self, call: NativeCall) -> Result<()> {
        let call = call.to_method_call()?;
        let method = call.method.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        tracing::debug!(method = %method, "invoking native method");

        self.calls
            .send(PendingCall { call, reply: reply_tx })
            .await
            .map_err(|_| BridgeError::Unavailable("platform endpoint closed".to_string()))?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Err(_) => Err(BridgeError::Timeout(method)),
            Ok(Err(_)) => Err(BridgeError::Unavailable(format!("{method} dropped unanswered"))),
            Ok(Ok(Err(message))) => Err(BridgeError::CallFailed { method, message }),
            Ok(Ok(Ok(_))) => Ok(()),
        }
    }
}

impl PlatformEndpoint {
    /// Wait for the next call from the application
    pub async fn next_call(&mut self) -> Option<PendingCall> {
        self.calls.recv().await
    }

    /// Take a call if one is already queued
    pub fn try_next_call(&mut self) -> Option<PendingCall> {
        self.calls.try_recv().ok()
    }

    /// Push an event to the application
    ///
    /// The event is validated here; malformed events never reach
    /// application code.
    pub async fn emit(&self, method: &str, arguments: Value) -> Result<()> {
        let event = NativeEvent::from_method_call(&MethodCall::new(method, arguments))?;
        self.events
            .send(event)
            .await
            .map_err(|_| BridgeError::Unavailable("event stream closed".to_string()))
    }
}
