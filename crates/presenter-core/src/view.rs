//! View selection for the call screen
//!
//! [`select_view`] maps a small tuple of session facts to exactly one body
//! view. It is total over [`ViewInputs`] and has no side effects, so the same
//! inputs always produce the same view. Header and button rows are selected
//! the same way by [`Header::from_state`] and [`select_controls`].
//!
//! # Video layouts
//!
//! | local video | remote video | layout                  |
//! |-------------|--------------|-------------------------|
//! | on          | on           | `Dual`                  |
//! | muted       | on           | `RemoteOnly`            |
//! | on          | muted        | `LocalWithPlaceholder`  |
//! | muted       | muted        | `Placeholders`          |

use crate::registration::RegistrationState;
use crate::session::Session;
use crate::types::{CallDirection, CallPhase, CallType, StreamHandle};

/// Facts the body view depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewInputs {
    pub registered: bool,
    pub direction: CallDirection,
    pub call_type: CallType,
    pub phase: CallPhase,
    pub local_video_muted: bool,
    pub remote_video_muted: bool,
    pub has_local_stream: bool,
    pub has_remote_stream: bool,
}

impl ViewInputs {
    pub fn from_session(session: &Session, registered: bool) -> Self {
        Self {
            registered,
            direction: session.direction,
            call_type: session.call_type,
            phase: session.phase,
            local_video_muted: session.local_video_muted,
            remote_video_muted: session.remote_video_muted,
            has_local_stream: session.local_stream.is_some(),
            has_remote_stream: session.remote_stream.is_some(),
        }
    }
}

/// Arrangement of the video area for an established client call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoLayout {
    /// Remote full screen with local self view
    Dual,
    /// Remote only; local camera is off
    RemoteOnly,
    /// "No video" placeholder with local self view
    LocalWithPlaceholder,
    /// Placeholders only, no live video
    Placeholders,
}

impl VideoLayout {
    pub fn for_flags(local_video_muted: bool, remote_video_muted: bool) -> Self {
        match (local_video_muted, remote_video_muted) {
            (false, false) => VideoLayout::Dual,
            (true, false) => VideoLayout::RemoteOnly,
            (false, true) => VideoLayout::LocalWithPlaceholder,
            (true, true) => VideoLayout::Placeholders,
        }
    }

    pub fn shows_remote(&self) -> bool {
        matches!(self, VideoLayout::Dual | VideoLayout::RemoteOnly)
    }

    pub fn shows_local(&self) -> bool {
        matches!(self, VideoLayout::Dual | VideoLayout::LocalWithPlaceholder)
    }

    pub fn shows_placeholder(&self) -> bool {
        matches!(self, VideoLayout::LocalWithPlaceholder | VideoLayout::Placeholders)
    }
}

/// Main body of the call screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Registration failed or has not completed
    CredentialsMissing,
    /// Idle, ready to dial a client or a service
    Dial,
    /// Waiting for the other side ("Calling ...")
    Calling,
    /// Inbound call waiting for accept/reject
    Incoming,
    /// Service call with DTMF keypad
    Keypad { calling: bool },
    /// Connected, streams not yet bound
    MediaPending,
    /// Connected client call with both streams
    Video(VideoLayout),
}

/// Select the body view; total and deterministic
pub fn select_view(inputs: &ViewInputs) -> View {
    if !inputs.registered {
        return View::CredentialsMissing;
    }
    match inputs.call_type {
        CallType::Service => View::Keypad {
            calling: matches!(inputs.phase, CallPhase::Calling | CallPhase::Ringing),
        },
        CallType::Client => match inputs.phase {
            CallPhase::IncomingCall => View::Incoming,
            CallPhase::Connected => {
                if inputs.has_local_stream && inputs.has_remote_stream {
                    View::Video(VideoLayout::for_flags(
                        inputs.local_video_muted,
                        inputs.remote_video_muted,
                    ))
                } else {
                    View::MediaPending
                }
            }
            _ => View::Calling,
        },
        CallType::None => match inputs.direction {
            // Mid-transition only: an active call always carries a call type
            CallDirection::Inbound if inputs.phase == CallPhase::IncomingCall => View::Incoming,
            _ => View::Dial,
        },
    }
}

/// Button row under the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controls {
    /// Idle: nothing to press
    None,
    /// Reject / Accept
    IncomingPrompt,
    /// Hang up / Speaker, plus camera and mic buttons once a client call is connected
    InCall { media: Option<MediaControls> },
}

/// Camera-swap, video and mic buttons with their current icon state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaControls {
    pub video_muted: bool,
    pub mic_muted: bool,
}

pub fn select_controls(session: &Session) -> Controls {
    if session.can_answer() {
        return Controls::IncomingPrompt;
    }
    if !session.is_active() {
        return Controls::None;
    }
    let media = session.has_media_controls().then_some(MediaControls {
        video_muted: session.local_video_muted,
        mic_muted: session.local_mic_muted,
    });
    Controls::InCall { media }
}

/// Screen header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Client id when registered; `None` shows the credentials warning
    pub registered_as: Option<String>,
    pub phase: CallPhase,
    pub outbound: bool,
    pub inbound: bool,
    /// Settings (back to credentials) is offered only while idle
    pub show_settings: bool,
}

impl Header {
    pub fn from_state(session: &Session, registration: &RegistrationState) -> Self {
        Self {
            registered_as: registration.client().map(|c| c.client_id.clone()),
            phase: session.phase,
            outbound: session.is_outbound(),
            inbound: session.is_inbound(),
            show_settings: session.phase == CallPhase::Idle,
        }
    }
}

/// Everything the call screen shows for one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub header: Header,
    pub body: View,
    pub controls: Controls,
    /// Client id or service name for "Calling ..." and keypad titles
    pub peer: Option<String>,
    pub speaker_on: bool,
    pub local_stream: Option<StreamHandle>,
    pub remote_stream: Option<StreamHandle>,
}

impl Screen {
    pub fn compose(session: &Session, registration: &RegistrationState) -> Self {
        let inputs = ViewInputs::from_session(session, registration.is_registered());
        Self {
            header: Header::from_state(session, registration),
            body: select_view(&inputs),
            controls: select_controls(session),
            peer: session.peer.as_ref().map(|p| p.to_string()),
            speaker_on: session.speaker_on,
            local_stream: session.local_stream.clone(),
            remote_stream: session.remote_stream.clone(),
        }
    }
}
