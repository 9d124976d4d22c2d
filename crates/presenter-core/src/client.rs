//! Contract for the external WebRTC call client
//!
//! Signaling, media negotiation and transport all live behind this trait.
//! The presenter issues requests and learns their outcome only through the
//! notifications delivered to its [`CallEventHandler`].
//!
//! ```text
//! ┌─────────────────────────┐
//! │      CallPresenter      │
//! └──────┬───────────▲──────┘
//!        │ requests  │ notifications
//! ┌──────▼───────────┴──────┐
//! │   CallClient (external) │
//! └─────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PresenterResult;
use crate::events::{CallEventHandler, SubscriptionId};
use crate::registration::{RegisteredClient, RegistrationParams};
use crate::types::{CallHandle, DtmfDigit, MuteState, StreamHandle};

/// Capabilities the presenter needs from a WebRTC call client
#[async_trait]
pub trait CallClient: Send + Sync {
    /// Register with the cloud; `Ok(None)` when the credentials were refused
    async fn register(&self, params: &RegistrationParams) -> PresenterResult<Option<RegisteredClient>>;

    /// Drop the registration
    async fn unregister(&self) -> PresenterResult<()>;

    /// Call another registered client
    async fn call_client(&self, client_id: &str) -> PresenterResult<CallHandle>;

    /// Call a cloud service by name
    async fn call_service(&self, service_name: &str) -> PresenterResult<CallHandle>;

    async fn answer(&self, call: CallHandle) -> PresenterResult<()>;

    async fn reject(&self, call: CallHandle) -> PresenterResult<()>;

    /// Tear the call down from any phase
    async fn stop_call(&self, call: CallHandle) -> PresenterResult<()>;

    async fn send_dtmf(&self, digit: DtmfDigit, call: CallHandle) -> PresenterResult<()>;

    /// Apply the local mute state to the call's outgoing tracks
    async fn mute(&self, call: CallHandle, state: MuteState) -> PresenterResult<()>;

    /// Switch between front and back camera
    async fn swap_cam(&self, video_muted: bool, call: CallHandle) -> PresenterResult<()>;

    /// Look up the local media stream of an established call
    async fn get_local_stream(&self, call: CallHandle) -> PresenterResult<Option<StreamHandle>>;

    /// Route audio to the loudspeaker or the earpiece
    async fn set_speaker(&self, on: bool) -> PresenterResult<()>;

    /// Install the notification handler, replacing any previous one
    fn subscribe(&self, handler: Arc<dyn CallEventHandler>) -> PresenterResult<SubscriptionId>;

    /// Release a handler installed by [`subscribe`](CallClient::subscribe)
    fn unsubscribe(&self, id: SubscriptionId);
}
