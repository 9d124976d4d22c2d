//! Call-client notifications and the handler contract
//!
//! The call client reports call progress through a single installed
//! [`CallEventHandler`]. Each notification kind has its own callback; the
//! dispatching [`CallEventHandler::on_notification`] routes a
//! [`CallNotification`] value to the matching callback.
//!
//! # Usage Examples
//!
//! ```rust
//! use softphone_presenter::events::{CallEventHandler, IncomingCallInfo, NotificationHub};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct LoggingHandler;
//!
//! #[async_trait]
//! impl CallEventHandler for LoggingHandler {
//!     async fn on_incoming_call(&self, info: IncomingCallInfo) {
//!         println!("Incoming call from {}", info.caller_id);
//!     }
//! }
//!
//! let hub = NotificationHub::new();
//! let id = hub.subscribe(Arc::new(LoggingHandler));
//! assert!(hub.is_subscribed(id));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::types::{CallHandle, StreamHandle};

/// Identifier of an installed notification handler
pub type SubscriptionId = Uuid;

/// Details of an inbound call invitation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCallInfo {
    /// Handle to use for answer/reject
    pub call: CallHandle,
    /// Client id of the caller
    pub caller_id: String,
    /// When the invitation arrived
    pub received_at: DateTime<Utc>,
}

impl IncomingCallInfo {
    pub fn new(call: CallHandle, caller_id: impl Into<String>) -> Self {
        Self {
            call,
            caller_id: caller_id.into(),
            received_at: Utc::now(),
        }
    }
}

/// Media progress for a call
///
/// Later call-client versions attach the remote stream at `GotMedia`, older
/// ones at `Connected`; either may carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub call: CallHandle,
    pub remote_stream: Option<StreamHandle>,
}

impl MediaInfo {
    pub fn new(call: CallHandle) -> Self {
        Self {
            call,
            remote_stream: None,
        }
    }

    pub fn with_remote_stream(mut self, stream: StreamHandle) -> Self {
        self.remote_stream = Some(stream);
        self
    }
}

/// Lifecycle notification delivered by the call client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallNotification {
    IncomingCall(IncomingCallInfo),
    Ringing { call: CallHandle },
    GotMedia(MediaInfo),
    Connected(MediaInfo),
    Disconnected { call: Option<CallHandle> },
    LocalVideoMute,
    LocalVideoUnmute,
    RemoteVideoMute,
    RemoteVideoUnmute,
}

impl CallNotification {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            CallNotification::IncomingCall(_) => "incoming_call",
            CallNotification::Ringing { .. } => "ringing",
            CallNotification::GotMedia(_) => "got_media",
            CallNotification::Connected(_) => "connected",
            CallNotification::Disconnected { .. } => "disconnected",
            CallNotification::LocalVideoMute => "local_video_mute",
            CallNotification::LocalVideoUnmute => "local_video_unmute",
            CallNotification::RemoteVideoMute => "remote_video_mute",
            CallNotification::RemoteVideoUnmute => "remote_video_unmute",
        }
    }
}

/// Receiver of call-client notifications
///
/// Every callback has an empty default so handlers only override what they
/// care about. The call client always delivers through
/// [`on_notification`](CallEventHandler::on_notification); override that
/// instead of the individual callbacks if you want the raw value.
#[async_trait]
pub trait CallEventHandler: Send + Sync {
    /// A remote client is calling
    async fn on_incoming_call(&self, _info: IncomingCallInfo) {}

    /// The outbound call is ringing at the far end
    async fn on_ringing(&self, _call: CallHandle) {}

    /// Media has been negotiated
    async fn on_got_media(&self, _info: MediaInfo) {}

    /// The call is established
    async fn on_connected(&self, _info: MediaInfo) {}

    /// The call ended, for whatever reason
    async fn on_disconnected(&self, _call: Option<CallHandle>) {}

    async fn on_local_video_mute(&self) {}

    async fn on_local_video_unmute(&self) {}

    async fn on_remote_video_mute(&self) {}

    async fn on_remote_video_unmute(&self) {}

    /// Route a notification to the matching callback
    async fn on_notification(&self, notification: CallNotification) {
        match notification {
            CallNotification::IncomingCall(info) => self.on_incoming_call(info).await,
            CallNotification::Ringing { call } => self.on_ringing(call).await,
            CallNotification::GotMedia(info) => self.on_got_media(info).await,
            CallNotification::Connected(info) => self.on_connected(info).await,
            CallNotification::Disconnected { call } => self.on_disconnected(call).await,
            CallNotification::LocalVideoMute => self.on_local_video_mute().await,
            CallNotification::LocalVideoUnmute => self.on_local_video_unmute().await,
            CallNotification::RemoteVideoMute => self.on_remote_video_mute().await,
            CallNotification::RemoteVideoUnmute => self.on_remote_video_unmute().await,
        }
    }
}

struct Subscription {
    id: SubscriptionId,
    handler: Arc<dyn CallEventHandler>,
}

/// Single-slot notification dispatcher for call-client implementations
///
/// Holds at most one handler. Subscribing again replaces the previous
/// handler, so exactly one callback per notification kind is ever live.
pub struct NotificationHub {
    slot: RwLock<Option<Subscription>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Install `handler`, replacing any previous one
    pub fn subscribe(&self, handler: Arc<dyn CallEventHandler>) -> SubscriptionId {
        let id = Uuid::new_v4();
        let previous = self.slot.write().replace(Subscription { id, handler });
        if let Some(previous) = previous {
            tracing::warn!(
                "Replacing notification handler {} with {}",
                previous.id,
                id
            );
        }
        id
    }

    /// Remove the handler if it is still the installed one
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut slot = self.slot.write();
        if slot.as_ref().is_some_and(|s| s.id == id) {
            slot.take();
            true
        } else {
            false
        }
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.slot.read().as_ref().is_some_and(|s| s.id == id)
    }

    pub fn has_subscriber(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Deliver a notification; returns `false` when nobody is listening
    pub async fn emit(&self, notification: CallNotification) -> bool {
        // Clone out of the lock so the handler may resubscribe while running
        let handler = self.slot.read().as_ref().map(|s| s.handler.clone());
        match handler {
            Some(handler) => {
                handler.on_notification(notification).await;
                true
            }
            None => {
                tracing::debug!("Dropping {} notification, no handler", notification.name());
                false
            }
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
