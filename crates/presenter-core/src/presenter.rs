//! Call-session presenter
//!
//! [`CallPresenter`] owns the [`Session`] and the registration state for one
//! call screen. It installs a single notification handler on mount, funnels
//! every notification and every completed asynchronous lookup through
//! [`reduce`], and exposes the user actions of the call screen.
//!
//! All mutation happens on the task that drives the presenter; notifications
//! and local-stream results arrive over channels and are applied one at a
//! time by [`CallPresenter::process_next`].
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use softphone_presenter::{CallPresenter, LoopbackCallClient, RegistrationParams, View};
//!
//! # async fn example(params: RegistrationParams) -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(LoopbackCallClient::new());
//! let mut presenter = CallPresenter::new(client, params);
//! presenter.mount();
//!
//! let screen = presenter.refresh().await;
//! assert_eq!(screen.body, View::Dial);
//!
//! presenter.place_client_call("anna123").await?;
//! while presenter.process_next().await {
//!     println!("{:?}", presenter.screen().body);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::CallClient;
use crate::error::{PresenterError, PresenterResult};
use crate::events::{CallEventHandler, CallNotification, SubscriptionId};
use crate::reducer::{reduce, Effect, Outcome, SessionInput};
use crate::registration::{RegistrationParams, RegistrationState};
use crate::session::Session;
use crate::types::{CallHandle, CallType, DtmfDigit, PeerId};
use crate::view::Screen;

/// Forwards call-client notifications into the presenter's queue
struct NotificationForwarder {
    tx: mpsc::UnboundedSender<CallNotification>,
}

#[async_trait]
impl CallEventHandler for NotificationForwarder {
    async fn on_notification(&self, notification: CallNotification) {
        if self.tx.send(notification).is_err() {
            debug!("Presenter gone, notification dropped");
        }
    }
}

/// Presenter for the call screen of a single registered client
pub struct CallPresenter {
    client: Arc<dyn CallClient>,
    params: RegistrationParams,
    session: Session,
    registration: RegistrationState,
    subscription: Option<SubscriptionId>,
    notifications: Option<mpsc::UnboundedReceiver<CallNotification>>,
    completions_tx: mpsc::UnboundedSender<SessionInput>,
    completions_rx: mpsc::UnboundedReceiver<SessionInput>,
    /// Spawned local stream lookups whose result has not been applied yet
    lookups_in_flight: usize,
}

impl CallPresenter {
    pub fn new(client: Arc<dyn CallClient>, params: RegistrationParams) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            client,
            params,
            session: Session::default(),
            registration: RegistrationState::default(),
            subscription: None,
            notifications: None,
            completions_tx,
            completions_rx,
            lookups_in_flight: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registration(&self) -> &RegistrationState {
        &self.registration
    }

    pub fn params(&self) -> &RegistrationParams {
        &self.params
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Install the notification handler once
    ///
    /// Calling it again while mounted does nothing. A failure to install is
    /// logged and the screen keeps rendering without notifications.
    pub fn mount(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        match self.client.subscribe(Arc::new(NotificationForwarder { tx })) {
            Ok(id) => {
                debug!("Notification handler {} installed", id);
                self.subscription = Some(id);
                self.notifications = Some(rx);
            }
            Err(e) => {
                error!("[call client] failed to install notification handler: {}", e);
            }
        }
    }

    /// Release the notification handler
    pub fn unmount(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.client.unsubscribe(id);
            debug!("Notification handler {} released", id);
        }
        self.notifications = None;
    }

    /// Register if needed, then compose the screen
    pub async fn refresh(&mut self) -> Screen {
        self.ensure_registered().await;
        self.screen()
    }

    /// Compose the screen for the current state
    pub fn screen(&self) -> Screen {
        Screen::compose(&self.session, &self.registration)
    }

    /// Attempt registration unless a client already exists or one is in flight
    ///
    /// A refused registration leaves the presenter in
    /// [`RegistrationState::Failed`]; the next call tries again.
    pub async fn ensure_registered(&mut self) -> bool {
        if !self.registration.needs_attempt() {
            return self.registration.is_registered();
        }
        let attempts = self.registration.failed_attempts() + 1;
        self.registration = RegistrationState::Registering;

        match self.client.register(&self.params).await {
            Ok(Some(client)) => {
                info!("Registered as {}", client.client_id);
                self.registration = RegistrationState::Registered(client);
                true
            }
            Ok(None) => {
                let refused = PresenterError::RegistrationFailed {
                    client_id: self.params.register_client_id.clone(),
                };
                warn!("{} (attempt {})", refused, attempts);
                self.registration = RegistrationState::Failed { attempts };
                false
            }
            Err(e) => {
                warn!("Registration error for {}: {}", self.params.register_client_id, e);
                self.registration = RegistrationState::Failed { attempts };
                false
            }
        }
    }

    /// Call another registered client
    pub async fn place_client_call(&mut self, client_id: &str) -> PresenterResult<CallHandle> {
        self.place_call(CallType::Client, client_id).await
    }

    /// Call a cloud service
    pub async fn place_service_call(&mut self, service_name: &str) -> PresenterResult<CallHandle> {
        self.place_call(CallType::Service, service_name).await
    }

    async fn place_call(&mut self, call_type: CallType, input: &str) -> PresenterResult<CallHandle> {
        let Some(peer) = PeerId::parse(input) else {
            debug!("Ignoring {:?} call to an empty identifier", call_type);
            return Err(PresenterError::EmptyPeerId);
        };
        if !self.registration.is_registered() {
            return Err(PresenterError::NotRegistered);
        }
        if self.session.is_active() {
            return Err(PresenterError::invalid_state("a call is already in progress"));
        }

        self.apply(SessionInput::PlaceCall { call_type, peer: peer.clone() });
        let tag = self.session.id;
        info!("Placing {:?} call to {} ({})", call_type, peer, tag);

        let placed = match call_type {
            CallType::Service => self.client.call_service(peer.as_str()).await,
            _ => self.client.call_client(peer.as_str()).await,
        };
        match placed {
            Ok(call) => {
                self.apply(SessionInput::CallPlaced { session: tag, call });
                Ok(call)
            }
            Err(e) => {
                warn!("Call to {} failed to start: {}", peer, e);
                self.apply(SessionInput::PlaceCallFailed { session: tag });
                Err(e)
            }
        }
    }

    /// Accept the waiting inbound call
    pub async fn accept(&mut self) -> PresenterResult<()> {
        let call = self.incoming_call("accept")?;
        info!("Accepting call {}", call);
        self.client.answer(call).await
    }

    /// Reject the waiting inbound call; the session resets on `Disconnected`
    pub async fn reject(&mut self) -> PresenterResult<()> {
        let call = self.incoming_call("reject")?;
        info!("Rejecting call {}", call);
        self.client.reject(call).await
    }

    fn incoming_call(&self, action: &str) -> PresenterResult<CallHandle> {
        if !self.session.can_answer() {
            return Err(PresenterError::invalid_state(format!(
                "cannot {} in phase {}",
                action, self.session.phase
            )));
        }
        self.session.call.ok_or(PresenterError::NoActiveCall)
    }

    /// Ask the call client to tear the call down
    pub async fn hang_up(&mut self) -> PresenterResult<()> {
        if !self.session.can_hang_up() {
            return Err(PresenterError::invalid_state("no call to hang up"));
        }
        let call = self.active_call()?;
        info!("Hanging up call {}", call);
        self.client.stop_call(call).await
    }

    /// Flip the local camera mute and push the mute state to the call client
    pub async fn toggle_camera(&mut self) -> PresenterResult<()> {
        let call = self.media_call()?;
        self.apply(SessionInput::ToggleCamera);
        self.client.mute(call, self.session.mute_state()).await
    }

    /// Flip the local mic mute and push the mute state to the call client
    pub async fn toggle_mic(&mut self) -> PresenterResult<()> {
        let call = self.media_call()?;
        self.apply(SessionInput::ToggleMic);
        self.client.mute(call, self.session.mute_state()).await
    }

    pub async fn toggle_speaker(&mut self) -> PresenterResult<()> {
        if !self.session.is_active() {
            return Err(PresenterError::NoActiveCall);
        }
        self.apply(SessionInput::ToggleSpeaker);
        self.client.set_speaker(self.session.speaker_on).await
    }

    pub async fn swap_camera(&mut self) -> PresenterResult<()> {
        let call = self.media_call()?;
        self.client.swap_cam(self.session.local_video_muted, call).await
    }

    /// Send one keypad digit; no local state changes
    pub async fn send_dtmf(&mut self, key: char) -> PresenterResult<()> {
        let digit = DtmfDigit::try_from(key)?;
        if !self.session.can_send_dtmf() {
            return Err(PresenterError::invalid_state(format!(
                "DTMF needs an established call, phase is {}",
                self.session.phase
            )));
        }
        let call = self.active_call()?;
        debug!("Sending DTMF {} on {}", digit, call);
        self.client.send_dtmf(digit, call).await
    }

    /// Camera and mic actions exist only where their buttons are shown
    fn media_call(&self) -> PresenterResult<CallHandle> {
        let call = self.active_call()?;
        if !self.session.has_media_controls() {
            return Err(PresenterError::invalid_state(format!(
                "camera and mic controls need a connected client call, phase is {}",
                self.session.phase
            )));
        }
        Ok(call)
    }

    fn active_call(&self) -> PresenterResult<CallHandle> {
        if !self.session.is_active() {
            return Err(PresenterError::NoActiveCall);
        }
        self.session.call.ok_or(PresenterError::NoActiveCall)
    }

    /// Unregister and leave the call screen
    ///
    /// Only offered while idle. The notification handler is released when
    /// the presenter is dropped.
    pub async fn unregister(mut self) -> PresenterResult<()> {
        if self.session.is_active() {
            return Err(PresenterError::invalid_state("settings are only available while idle"));
        }
        self.unmount();
        self.registration = RegistrationState::Unregistered;
        info!("Unregistering {}", self.params.register_client_id);
        self.client.unregister().await
    }

    /// Apply one call-client notification
    ///
    /// Must run inside a tokio runtime: a `Connected` notification spawns the
    /// local stream lookup.
    pub fn handle_notification(&mut self, notification: CallNotification) -> Outcome {
        self.apply(SessionInput::Notification(notification))
    }

    /// Wait for the next notification or completed lookup and apply it
    ///
    /// Returns `false` once no further input can arrive: the presenter is
    /// not mounted (or its handler was replaced) and no local stream lookup
    /// is outstanding.
    pub async fn process_next(&mut self) -> bool {
        loop {
            let listening = self.notifications.is_some();
            let awaiting_lookup = self.lookups_in_flight > 0;
            if !listening && !awaiting_lookup {
                return false;
            }

            let received = tokio::select! {
                biased;
                notification = next_notification(&mut self.notifications), if listening => match notification {
                    Some(notification) => Received::Input(SessionInput::Notification(notification)),
                    None => Received::NotificationsClosed,
                },
                Some(completion) = self.completions_rx.recv(), if awaiting_lookup => Received::Input(completion),
                else => return false,
            };

            match received {
                Received::Input(input) => {
                    if matches!(input, SessionInput::LocalStreamResolved { .. }) {
                        self.lookups_in_flight = self.lookups_in_flight.saturating_sub(1);
                    }
                    self.apply(input);
                    return true;
                }
                Received::NotificationsClosed => {
                    debug!("Notification channel closed, handler no longer installed");
                    self.notifications = None;
                }
            }
        }
    }

    fn apply(&mut self, input: SessionInput) -> Outcome {
        let label = input_label(&input);
        let transition = reduce(&self.session, input);
        match transition.outcome {
            Outcome::Applied => debug!(
                "{} applied: {:?}/{} ({})",
                label, transition.session.direction, transition.session.phase, transition.session.id
            ),
            Outcome::Ignored(reason) => debug!("{} ignored: {}", label, reason),
        }
        self.session = transition.session;
        for effect in transition.effects {
            self.run_effect(effect);
        }
        transition.outcome
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchLocalStream { session, call } => {
                self.lookups_in_flight += 1;
                let client = self.client.clone();
                let tx = self.completions_tx.clone();
                tokio::spawn(async move {
                    let stream = match client.get_local_stream(call).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            warn!("Local stream lookup for {} failed: {}", call, e);
                            None
                        }
                    };
                    let _ = tx.send(SessionInput::LocalStreamResolved { session, stream });
                });
            }
        }
    }
}

impl Drop for CallPresenter {
    fn drop(&mut self) {
        self.unmount();
    }
}

enum Received {
    Input(SessionInput),
    NotificationsClosed,
}

async fn next_notification(
    rx: &mut Option<mpsc::UnboundedReceiver<CallNotification>>,
) -> Option<CallNotification> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn input_label(input: &SessionInput) -> &'static str {
    match input {
        SessionInput::Notification(notification) => notification.name(),
        SessionInput::PlaceCall { .. } => "place_call",
        SessionInput::CallPlaced { .. } => "call_placed",
        SessionInput::PlaceCallFailed { .. } => "place_call_failed",
        SessionInput::ToggleCamera => "toggle_camera",
        SessionInput::ToggleMic => "toggle_mic",
        SessionInput::ToggleSpeaker => "toggle_speaker",
        SessionInput::LocalStreamResolved { .. } => "local_stream_resolved",
    }
}
