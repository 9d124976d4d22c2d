//! Property tests for the session reducer and view selector

use proptest::prelude::*;
use uuid::Uuid;

use softphone_presenter::{
    reduce, select_view, CallDirection, CallHandle, CallNotification, CallPhase, CallType,
    IncomingCallInfo, MediaInfo, PeerId, Session, SessionId, SessionInput, StreamHandle, View,
    ViewInputs,
};

fn call_handle() -> impl Strategy<Value = CallHandle> {
    any::<u128>().prop_map(|n| CallHandle(Uuid::from_u128(n)))
}

fn media_info() -> impl Strategy<Value = MediaInfo> {
    (call_handle(), any::<bool>()).prop_map(|(call, with_stream)| {
        let info = MediaInfo::new(call);
        if with_stream {
            info.with_remote_stream(StreamHandle::new(format!("remote/{}", call)))
        } else {
            info
        }
    })
}

fn notification() -> impl Strategy<Value = CallNotification> {
    prop_oneof![
        (call_handle(), "[a-z0-9]{0,8}")
            .prop_map(|(call, caller)| CallNotification::IncomingCall(IncomingCallInfo::new(call, caller))),
        call_handle().prop_map(|call| CallNotification::Ringing { call }),
        media_info().prop_map(CallNotification::GotMedia),
        media_info().prop_map(CallNotification::Connected),
        proptest::option::of(call_handle()).prop_map(|call| CallNotification::Disconnected { call }),
        Just(CallNotification::LocalVideoMute),
        Just(CallNotification::LocalVideoUnmute),
        Just(CallNotification::RemoteVideoMute),
        Just(CallNotification::RemoteVideoUnmute),
    ]
}

fn input() -> impl Strategy<Value = SessionInput> {
    prop_oneof![
        4 => notification().prop_map(SessionInput::Notification),
        1 => (prop_oneof![Just(CallType::Client), Just(CallType::Service)], "[a-z]{1,8}")
            .prop_map(|(call_type, peer)| SessionInput::PlaceCall {
                call_type,
                peer: PeerId::parse(&peer).unwrap(),
            }),
        1 => (0u64..8, call_handle())
            .prop_map(|(id, call)| SessionInput::CallPlaced { session: SessionId(id), call }),
        1 => Just(SessionInput::ToggleCamera),
        1 => Just(SessionInput::ToggleMic),
        1 => (0u64..8).prop_map(|id| SessionInput::LocalStreamResolved {
            session: SessionId(id),
            stream: Some(StreamHandle::new("local")),
        }),
    ]
}

fn session_after(inputs: Vec<SessionInput>) -> Session {
    inputs
        .into_iter()
        .fold(Session::default(), |session, input| reduce(&session, input).session)
}

fn view_inputs() -> impl Strategy<Value = ViewInputs> {
    let direction = prop_oneof![
        Just(CallDirection::None),
        Just(CallDirection::Outbound),
        Just(CallDirection::Inbound)
    ];
    let call_type = prop_oneof![Just(CallType::None), Just(CallType::Client), Just(CallType::Service)];
    let phase = prop_oneof![
        Just(CallPhase::Idle),
        Just(CallPhase::Calling),
        Just(CallPhase::Ringing),
        Just(CallPhase::IncomingCall),
        Just(CallPhase::GotMedia),
        Just(CallPhase::Connected)
    ];
    (direction, call_type, phase, any::<[bool; 5]>()).prop_map(|(direction, call_type, phase, flags)| {
        ViewInputs {
            registered: flags[0],
            direction,
            call_type,
            phase,
            local_video_muted: flags[1],
            remote_video_muted: flags[2],
            has_local_stream: flags[3],
            has_remote_stream: flags[4],
        }
    })
}

proptest! {
    #[test]
    fn disconnect_always_resets(inputs in proptest::collection::vec(input(), 0..24), call in proptest::option::of(call_handle())) {
        let before = session_after(inputs);
        let after = reduce(&before, SessionInput::Notification(CallNotification::Disconnected { call })).session;

        prop_assert_eq!(after.phase, CallPhase::Idle);
        prop_assert_eq!(after.direction, CallDirection::None);
        prop_assert_eq!(after.call_type, CallType::None);
        prop_assert!(after.call.is_none());
        prop_assert!(after.local_stream.is_none() && after.remote_stream.is_none());
        prop_assert!(!after.local_video_muted && !after.remote_video_muted && !after.local_mic_muted);
        prop_assert!(after.id > before.id);
    }

    #[test]
    fn mute_flags_never_change_phase(inputs in proptest::collection::vec(input(), 0..24), which in 0usize..4) {
        let before = session_after(inputs);
        let flag = [
            CallNotification::LocalVideoMute,
            CallNotification::LocalVideoUnmute,
            CallNotification::RemoteVideoMute,
            CallNotification::RemoteVideoUnmute,
        ][which].clone();
        let after = reduce(&before, SessionInput::Notification(flag)).session;

        prop_assert_eq!(after.phase, before.phase);
        prop_assert_eq!(after.direction, before.direction);
        prop_assert_eq!(after.id, before.id);
        prop_assert_eq!(after.call, before.call);
    }

    #[test]
    fn session_ids_never_decrease(inputs in proptest::collection::vec(input(), 0..32)) {
        let mut session = Session::default();
        for input in inputs {
            let next = reduce(&session, input).session;
            prop_assert!(next.id >= session.id);
            session = next;
        }
    }

    #[test]
    fn idle_sessions_are_clean(inputs in proptest::collection::vec(input(), 0..32)) {
        let session = session_after(inputs);
        if session.direction == CallDirection::None {
            prop_assert_eq!(session.phase, CallPhase::Idle);
            prop_assert!(session.call.is_none());
        }
    }

    #[test]
    fn view_selection_is_total_and_deterministic(inputs in view_inputs()) {
        let first = select_view(&inputs);
        prop_assert_eq!(first, select_view(&inputs));

        if !inputs.registered {
            prop_assert_eq!(first, View::CredentialsMissing);
        }
        if let View::Video(_) = first {
            prop_assert!(inputs.has_local_stream && inputs.has_remote_stream);
            prop_assert_eq!(inputs.phase, CallPhase::Connected);
        }
    }
}
