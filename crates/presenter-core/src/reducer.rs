//! Single transition function for the call session
//!
//! Every input that can change a [`Session`] (call-client notifications,
//! optimistic user actions and completed asynchronous work) goes through
//! [`reduce`]. It never performs I/O; work that has to reach the call client
//! is returned as [`Effect`]s for the presenter to run.
//!
//! # State machine
//!
//! ```text
//!            place call                ringing          got media        connected
//!   Idle ───────────────▶ Calling ───────────▶ Ringing ──────────▶ GotMedia ─────────▶ Connected
//!    │                                                              ▲
//!    │ incoming call                         accept (got media)     │
//!    └──────────────────▶ IncomingCall ──────────────────────────────┘
//!
//!   any phase ── disconnected ──▶ Idle (hard reset, new session id)
//! ```

use chrono::Utc;

use crate::events::{CallNotification, IncomingCallInfo, MediaInfo};
use crate::session::Session;
use crate::types::{CallDirection, CallHandle, CallPhase, CallType, PeerId, SessionId, StreamHandle};

/// Input to the session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// Notification from the call client
    Notification(CallNotification),
    /// User asked to place a call; applied before the call client is contacted
    PlaceCall { call_type: CallType, peer: PeerId },
    /// The call client returned a handle for the call placed in `session`
    CallPlaced { session: SessionId, call: CallHandle },
    /// The call client refused to place the call started in `session`
    PlaceCallFailed { session: SessionId },
    ToggleCamera,
    ToggleMic,
    ToggleSpeaker,
    /// A local stream lookup issued for `session` finished
    LocalStreamResolved {
        session: SessionId,
        stream: Option<StreamHandle>,
    },
}

/// Work the presenter must carry out after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Look up the local stream, tagged with the session that asked for it
    FetchLocalStream { session: SessionId, call: CallHandle },
}

/// Whether an input changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(&'static str),
}

/// Result of [`reduce`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
    pub outcome: Outcome,
}

impl Transition {
    fn applied(session: Session) -> Self {
        Self {
            session,
            effects: Vec::new(),
            outcome: Outcome::Applied,
        }
    }

    fn ignored(session: &Session, reason: &'static str) -> Self {
        Self {
            session: session.clone(),
            effects: Vec::new(),
            outcome: Outcome::Ignored(reason),
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

/// Compute the session that follows `session` after `input`
pub fn reduce(session: &Session, input: SessionInput) -> Transition {
    match input {
        SessionInput::Notification(notification) => on_notification(session, notification),
        SessionInput::PlaceCall { call_type, peer } => place_call(session, call_type, peer),
        SessionInput::CallPlaced { session: tag, call } => {
            if tag != session.id || !session.is_outbound() {
                return Transition::ignored(session, "call handle for a finished session");
            }
            let mut next = session.clone();
            next.call = Some(call);
            Transition::applied(next)
        }
        SessionInput::PlaceCallFailed { session: tag } => {
            if tag != session.id {
                return Transition::ignored(session, "failure for a finished session");
            }
            Transition::applied(Session::idle(session.id.next()))
        }
        SessionInput::ToggleCamera => media_toggle(session, |s| s.local_video_muted = !s.local_video_muted),
        SessionInput::ToggleMic => media_toggle(session, |s| s.local_mic_muted = !s.local_mic_muted),
        SessionInput::ToggleSpeaker => toggle(session, |s| s.speaker_on = !s.speaker_on),
        SessionInput::LocalStreamResolved { session: tag, stream } => {
            if tag != session.id || session.phase != CallPhase::Connected {
                return Transition::ignored(session, "stale local stream");
            }
            let mut next = session.clone();
            next.local_stream = stream;
            Transition::applied(next)
        }
    }
}

fn place_call(session: &Session, call_type: CallType, peer: PeerId) -> Transition {
    if session.is_active() {
        return Transition::ignored(session, "a call is already in progress");
    }
    if call_type == CallType::None {
        return Transition::ignored(session, "no call type");
    }
    let mut next = Session::idle(session.id.next());
    next.direction = CallDirection::Outbound;
    next.call_type = call_type;
    next.phase = CallPhase::Calling;
    next.peer = Some(peer);
    Transition::applied(next)
}

fn toggle(session: &Session, flip: impl FnOnce(&mut Session)) -> Transition {
    if !session.is_active() {
        return Transition::ignored(session, "no call in progress");
    }
    let mut next = session.clone();
    flip(&mut next);
    Transition::applied(next)
}

fn media_toggle(session: &Session, flip: impl FnOnce(&mut Session)) -> Transition {
    if !session.has_media_controls() {
        return Transition::ignored(session, "camera and mic need a connected client call");
    }
    toggle(session, flip)
}

fn on_notification(session: &Session, notification: CallNotification) -> Transition {
    match notification {
        CallNotification::IncomingCall(info) => incoming_call(session, info),
        CallNotification::Ringing { .. } => {
            if !session.is_outbound() || !matches!(session.phase, CallPhase::Calling | CallPhase::Ringing) {
                return Transition::ignored(session, "ringing outside an outbound call");
            }
            let mut next = session.clone();
            next.phase = CallPhase::Ringing;
            Transition::applied(next)
        }
        CallNotification::GotMedia(info) => {
            if !session.is_active() {
                return Transition::ignored(session, "media without a call");
            }
            let mut next = session.clone();
            next.phase = CallPhase::GotMedia;
            bind_media(&mut next, info);
            Transition::applied(next)
        }
        CallNotification::Connected(info) => {
            if !session.is_active() {
                return Transition::ignored(session, "connected without a call");
            }
            let mut next = session.clone();
            next.phase = CallPhase::Connected;
            next.connected_at.get_or_insert_with(Utc::now);
            bind_media(&mut next, info);
            let call = next.call;
            let transition = Transition::applied(next);
            match call {
                Some(call) => {
                    let tag = transition.session.id;
                    transition.with_effect(Effect::FetchLocalStream { session: tag, call })
                }
                None => transition,
            }
        }
        CallNotification::Disconnected { .. } => Transition::applied(Session::idle(session.id.next())),
        CallNotification::LocalVideoMute => set_flag(session, |s| s.local_video_muted = true),
        CallNotification::LocalVideoUnmute => set_flag(session, |s| s.local_video_muted = false),
        CallNotification::RemoteVideoMute => set_flag(session, |s| s.remote_video_muted = true),
        CallNotification::RemoteVideoUnmute => set_flag(session, |s| s.remote_video_muted = false),
    }
}

fn incoming_call(session: &Session, info: IncomingCallInfo) -> Transition {
    if session.is_active() {
        return Transition::ignored(session, "a call is already in progress");
    }
    let mut next = Session::idle(session.id.next());
    next.direction = CallDirection::Inbound;
    next.call_type = CallType::Client;
    next.phase = CallPhase::IncomingCall;
    next.peer = PeerId::parse(&info.caller_id);
    next.call = Some(info.call);
    Transition::applied(next)
}

fn bind_media(session: &mut Session, info: MediaInfo) {
    if session.call.is_none() {
        session.call = Some(info.call);
    }
    if session.remote_stream.is_none() {
        session.remote_stream = info.remote_stream;
    }
}

fn set_flag(session: &Session, set: impl FnOnce(&mut Session)) -> Transition {
    if !session.is_active() {
        return Transition::ignored(session, "media flag without a call");
    }
    let mut next = session.clone();
    set(&mut next);
    Transition::applied(next)
}
