//! The call session value
//!
//! A [`Session`] is an immutable snapshot between inputs: the reducer takes
//! the current value and returns the next one. The view layer reads it and
//! never mutates it.

use chrono::{DateTime, Utc};

use crate::types::{
    CallDirection, CallHandle, CallPhase, CallType, MuteState, PeerId, SessionId, StreamHandle,
};

/// At most one logical call, from initiation or reception to teardown
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub id: SessionId,
    pub direction: CallDirection,
    pub call_type: CallType,
    pub phase: CallPhase,
    /// Client id or service name on the other end
    pub peer: Option<PeerId>,
    pub call: Option<CallHandle>,
    pub local_stream: Option<StreamHandle>,
    pub remote_stream: Option<StreamHandle>,
    pub local_video_muted: bool,
    pub local_mic_muted: bool,
    pub remote_video_muted: bool,
    pub speaker_on: bool,
    pub connected_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Idle session with the given identity
    pub fn idle(id: SessionId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Whether a call is in progress
    pub fn is_active(&self) -> bool {
        self.direction != CallDirection::None
    }

    pub fn is_outbound(&self) -> bool {
        self.direction == CallDirection::Outbound
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == CallDirection::Inbound
    }

    pub fn can_answer(&self) -> bool {
        self.is_inbound() && self.phase == CallPhase::IncomingCall
    }

    pub fn can_hang_up(&self) -> bool {
        self.is_active() && self.phase != CallPhase::Idle
    }

    pub fn can_send_dtmf(&self) -> bool {
        self.is_active() && self.phase.has_media() && self.call.is_some()
    }

    /// Camera, mic and camera-swap controls exist only on a connected client call
    pub fn has_media_controls(&self) -> bool {
        self.is_active() && self.call_type == CallType::Client && self.phase == CallPhase::Connected
    }

    pub fn mute_state(&self) -> MuteState {
        MuteState {
            mic_muted: self.local_mic_muted,
            camera_muted: self.local_video_muted,
        }
    }

    /// Seconds since the call connected
    pub fn connected_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.connected_at
            .map(|at| now.signed_duration_since(at).num_seconds().max(0))
    }
}
