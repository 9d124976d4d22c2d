//! Core value types shared by the presenter and its collaborators
//!
//! Handles issued by the call client are opaque: the presenter compares and
//! forwards them but never looks inside. Everything here is cheap to clone so
//! a [`Session`](crate::session::Session) snapshot can be handed to the view
//! layer on every render.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PresenterError, PresenterResult};

/// Opaque reference to a call owned by the call client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallHandle(pub Uuid);

impl CallHandle {
    /// Issue a fresh handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a live audio/video stream owned by the call client
///
/// The presenter holds it only long enough to bind it to a video view; the
/// `url` is what a renderer attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamHandle {
    /// Stream identifier assigned by the call client
    pub id: Uuid,
    /// Renderer URL for the stream
    pub url: String,
}

impl StreamHandle {
    /// Create a handle with a generated id
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
        }
    }
}

/// Identity of one logical call session
///
/// Bumped whenever a session starts or is torn down, so results of
/// asynchronous work can be matched against the session that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionId(pub u64);

impl SessionId {
    /// The identity that follows this one
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Direction of the active call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallDirection {
    /// No call
    #[default]
    None,
    /// Call placed by the local user
    Outbound,
    /// Call received from a remote client
    Inbound,
}

/// What kind of peer the call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallType {
    /// No call
    #[default]
    None,
    /// Another registered client (video capable)
    Client,
    /// A cloud service (audio with DTMF keypad)
    Service,
}

/// Lifecycle stage of a session, driven by call-client notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallPhase {
    /// No call in progress
    #[default]
    Idle,
    /// Outbound call requested, nothing heard back yet
    Calling,
    /// Remote side is ringing
    Ringing,
    /// An inbound call is waiting to be accepted or rejected
    IncomingCall,
    /// Media negotiated, not yet connected
    GotMedia,
    /// Call established
    Connected,
}

impl CallPhase {
    /// Label shown in the screen header
    pub fn label(&self) -> &'static str {
        match self {
            CallPhase::Idle => "idle",
            CallPhase::Calling => "calling",
            CallPhase::Ringing => "ringing",
            CallPhase::IncomingCall => "incomingCall",
            CallPhase::GotMedia => "gotMedia",
            CallPhase::Connected => "connected",
        }
    }

    /// Whether media has been negotiated for the call
    pub fn has_media(&self) -> bool {
        matches!(self, CallPhase::GotMedia | CallPhase::Connected)
    }
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Local mute state sent with every mute request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MuteState {
    pub mic_muted: bool,
    pub camera_muted: bool,
}

/// Keypad layout, row by row
pub const KEYPAD: [[char; 3]; 4] = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    ['*', '0', '#'],
];

/// A single validated DTMF digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DtmfDigit(char);

impl DtmfDigit {
    pub fn as_char(&self) -> char {
        self.0
    }
}

impl TryFrom<char> for DtmfDigit {
    type Error = PresenterError;

    fn try_from(digit: char) -> PresenterResult<Self> {
        if digit.is_ascii_digit() || digit == '*' || digit == '#' {
            Ok(Self(digit))
        } else {
            Err(PresenterError::InvalidDtmf { digit })
        }
    }
}

impl fmt::Display for DtmfDigit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remove every whitespace character from user input
pub fn delete_spaces(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

/// A non-empty client id or service name with whitespace removed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    /// Normalise raw input; `None` when nothing is left
    pub fn parse(input: &str) -> Option<Self> {
        let cleaned = delete_spaces(input);
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
