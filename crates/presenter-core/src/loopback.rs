//! In-process call client and token service
//!
//! [`LoopbackCallClient`] implements [`CallClient`] without any network. It
//! records every request, delivers notifications through a
//! [`NotificationHub`], and can walk calls through their lifecycle on its own
//! when auto-progress is enabled. With auto-progress off, the owner drives it
//! by calling [`LoopbackCallClient::emit`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use crate::client::CallClient;
use crate::config::LoopbackConfig;
use crate::error::{PresenterError, PresenterResult};
use crate::events::{CallEventHandler, CallNotification, IncomingCallInfo, MediaInfo, NotificationHub, SubscriptionId};
use crate::registration::{RegisteredClient, RegistrationParams, TokenRequest, TokenService};
use crate::types::{CallHandle, DtmfDigit, MuteState, StreamHandle};

/// Request received by the loopback client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Register { client_id: String },
    Unregister,
    CallClient { client_id: String, call: CallHandle },
    CallService { service_name: String, call: CallHandle },
    Answer(CallHandle),
    Reject(CallHandle),
    StopCall(CallHandle),
    SendDtmf { digit: char, call: CallHandle },
    Mute { call: CallHandle, state: MuteState },
    SwapCam { video_muted: bool, call: CallHandle },
    GetLocalStream(CallHandle),
    SetSpeaker(bool),
}

/// Call client that talks to nobody
pub struct LoopbackCallClient {
    hub: Arc<NotificationHub>,
    commands: Mutex<Vec<ClientCommand>>,
    accept_registration: AtomicBool,
    fail_calls: AtomicBool,
    fail_subscribe: AtomicBool,
    auto_progress: Option<Duration>,
    stream_gate: watch::Sender<bool>,
}

impl LoopbackCallClient {
    /// Manual client: registration accepted, no automatic notifications
    pub fn new() -> Self {
        let (stream_gate, _) = watch::channel(true);
        Self {
            hub: Arc::new(NotificationHub::new()),
            commands: Mutex::new(Vec::new()),
            accept_registration: AtomicBool::new(true),
            fail_calls: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            auto_progress: None,
            stream_gate,
        }
    }

    pub fn from_config(config: &LoopbackConfig) -> Self {
        let client = Self::new();
        client.set_accept_registration(config.accept_registration);
        Self {
            auto_progress: config.auto_progress.then(|| config.step_delay()),
            ..client
        }
    }

    pub fn set_accept_registration(&self, accept: bool) {
        self.accept_registration.store(accept, Ordering::SeqCst);
    }

    /// Make `call_client` / `call_service` return an error
    pub fn set_fail_calls(&self, fail: bool) {
        self.fail_calls.store(fail, Ordering::SeqCst);
    }

    /// Refuse notification handlers until switched back
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Park local stream lookups until [`release_local_streams`](Self::release_local_streams)
    pub fn hold_local_streams(&self) {
        self.stream_gate.send_replace(false);
    }

    pub fn release_local_streams(&self) {
        self.stream_gate.send_replace(true);
    }

    /// Every request received so far, oldest first
    pub fn commands(&self) -> Vec<ClientCommand> {
        self.commands.lock().clone()
    }

    pub fn has_subscriber(&self) -> bool {
        self.hub.has_subscriber()
    }

    /// Deliver a notification to the installed handler
    pub async fn emit(&self, notification: CallNotification) -> bool {
        self.hub.emit(notification).await
    }

    /// Announce an inbound call from `caller_id`
    pub async fn simulate_incoming(&self, caller_id: &str) -> CallHandle {
        let call = CallHandle::new();
        self.emit(CallNotification::IncomingCall(IncomingCallInfo::new(call, caller_id)))
            .await;
        call
    }

    pub fn remote_stream_for(call: CallHandle) -> StreamHandle {
        StreamHandle {
            id: call.0,
            url: format!("loopback://remote/{}", call),
        }
    }

    pub fn local_stream_for(call: CallHandle) -> StreamHandle {
        StreamHandle {
            id: Uuid::new_v4(),
            url: format!("loopback://local/{}", call),
        }
    }

    fn record(&self, command: ClientCommand) {
        tracing::debug!("loopback <- {:?}", command);
        self.commands.lock().push(command);
    }

    fn start_outbound(&self, call: CallHandle) -> PresenterResult<()> {
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(PresenterError::collaborator("loopback refused the call"));
        }
        if let Some(delay) = self.auto_progress {
            let steps = vec![
                CallNotification::Ringing { call },
                CallNotification::GotMedia(MediaInfo::new(call)),
                CallNotification::Connected(MediaInfo::new(call).with_remote_stream(Self::remote_stream_for(call))),
            ];
            self.play(steps, delay);
        }
        Ok(())
    }

    fn play(&self, steps: Vec<CallNotification>, delay: Duration) {
        let hub = self.hub.clone();
        tokio::spawn(async move {
            for step in steps {
                tokio::time::sleep(delay).await;
                hub.emit(step).await;
            }
        });
    }

    fn end_call(&self, call: CallHandle) {
        if let Some(delay) = self.auto_progress {
            self.play(vec![CallNotification::Disconnected { call: Some(call) }], delay);
        }
    }
}

impl Default for LoopbackCallClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallClient for LoopbackCallClient {
    async fn register(&self, params: &RegistrationParams) -> PresenterResult<Option<RegisteredClient>> {
        self.record(ClientCommand::Register {
            client_id: params.register_client_id.clone(),
        });
        let accepted = self.accept_registration.load(Ordering::SeqCst)
            && !params.register_client_id.is_empty()
            && !params.webrtc_token.is_empty();
        Ok(accepted.then(|| RegisteredClient::new(params.register_client_id.clone())))
    }

    async fn unregister(&self) -> PresenterResult<()> {
        self.record(ClientCommand::Unregister);
        Ok(())
    }

    async fn call_client(&self, client_id: &str) -> PresenterResult<CallHandle> {
        let call = CallHandle::new();
        self.record(ClientCommand::CallClient {
            client_id: client_id.to_string(),
            call,
        });
        self.start_outbound(call)?;
        Ok(call)
    }

    async fn call_service(&self, service_name: &str) -> PresenterResult<CallHandle> {
        let call = CallHandle::new();
        self.record(ClientCommand::CallService {
            service_name: service_name.to_string(),
            call,
        });
        self.start_outbound(call)?;
        Ok(call)
    }

    async fn answer(&self, call: CallHandle) -> PresenterResult<()> {
        self.record(ClientCommand::Answer(call));
        if let Some(delay) = self.auto_progress {
            self.play(
                vec![
                    CallNotification::GotMedia(MediaInfo::new(call).with_remote_stream(Self::remote_stream_for(call))),
                    CallNotification::Connected(MediaInfo::new(call)),
                ],
                delay,
            );
        }
        Ok(())
    }

    async fn reject(&self, call: CallHandle) -> PresenterResult<()> {
        self.record(ClientCommand::Reject(call));
        self.end_call(call);
        Ok(())
    }

    async fn stop_call(&self, call: CallHandle) -> PresenterResult<()> {
        self.record(ClientCommand::StopCall(call));
        self.end_call(call);
        Ok(())
    }

    async fn send_dtmf(&self, digit: DtmfDigit, call: CallHandle) -> PresenterResult<()> {
        self.record(ClientCommand::SendDtmf {
            digit: digit.as_char(),
            call,
        });
        Ok(())
    }

    async fn mute(&self, call: CallHandle, state: MuteState) -> PresenterResult<()> {
        self.record(ClientCommand::Mute { call, state });
        Ok(())
    }

    async fn swap_cam(&self, video_muted: bool, call: CallHandle) -> PresenterResult<()> {
        self.record(ClientCommand::SwapCam { video_muted, call });
        Ok(())
    }

    async fn get_local_stream(&self, call: CallHandle) -> PresenterResult<Option<StreamHandle>> {
        self.record(ClientCommand::GetLocalStream(call));
        let mut gate = self.stream_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        Ok(Some(Self::local_stream_for(call)))
    }

    async fn set_speaker(&self, on: bool) -> PresenterResult<()> {
        self.record(ClientCommand::SetSpeaker(on));
        Ok(())
    }

    fn subscribe(&self, handler: Arc<dyn CallEventHandler>) -> PresenterResult<SubscriptionId> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(PresenterError::subscription("loopback client refused the handler"));
        }
        Ok(self.hub.subscribe(handler))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.hub.unsubscribe(id);
    }
}

/// Token service that issues a token for any complete request
#[derive(Debug, Default)]
pub struct LoopbackTokenService {
    issued: Mutex<Vec<TokenRequest>>,
}

impl LoopbackTokenService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issued(&self) -> Vec<TokenRequest> {
        self.issued.lock().clone()
    }
}

#[async_trait]
impl TokenService for LoopbackTokenService {
    async fn get_token(&self, request: &TokenRequest) -> PresenterResult<Option<String>> {
        let complete = [
            &request.register_client_id,
            &request.cloud_region_id,
            &request.cloud_username,
            &request.api_access_key,
        ]
        .iter()
        .all(|field| !field.is_empty());
        if !complete {
            return Ok(None);
        }
        self.issued.lock().push(request.clone());
        Ok(Some(format!("loopback-{}", Uuid::new_v4().simple())))
    }
}
