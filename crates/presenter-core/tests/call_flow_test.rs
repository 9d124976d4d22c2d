//! Call flow tests against the loopback call client
//!
//! These drive a `CallPresenter` the way a shell would: user actions go in
//! through the presenter, call progress comes back as notifications that the
//! test emits on the loopback client.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use softphone_presenter::{
    CallNotification, CallPhase, CallPresenter, ClientCommand, Controls, LoopbackCallClient,
    MediaInfo, PresenterError, RegistrationParams, RegistrationState, View, VideoLayout,
};

fn params(client_id: &str) -> RegistrationParams {
    RegistrationParams {
        cloud_region_id: "0-2-0".to_string(),
        webrtc_access_key: "webrtc-key".to_string(),
        register_client_id: client_id.to_string(),
        log_level: "2".to_string(),
        webrtc_token: "token".to_string(),
    }
}

async fn mounted(client_id: &str) -> (Arc<LoopbackCallClient>, CallPresenter) {
    let client = Arc::new(LoopbackCallClient::new());
    let mut presenter = CallPresenter::new(client.clone(), params(client_id));
    presenter.mount();
    let screen = presenter.refresh().await;
    assert_eq!(screen.body, View::Dial);
    (client, presenter)
}

/// Apply exactly one queued input, failing the test if none arrives
async fn step(presenter: &mut CallPresenter) {
    let processed = timeout(Duration::from_secs(2), presenter.process_next())
        .await
        .expect("no input arrived");
    assert!(processed);
}

async fn deliver(client: &LoopbackCallClient, presenter: &mut CallPresenter, n: CallNotification) {
    assert!(client.emit(n).await, "no handler installed");
    step(presenter).await;
}

/// Place a client call and walk it to connected with both streams bound
async fn connect_client_call(
    client: &LoopbackCallClient,
    presenter: &mut CallPresenter,
    peer: &str,
) -> softphone_presenter::CallHandle {
    let call = presenter.place_client_call(peer).await.unwrap();
    deliver(client, presenter, CallNotification::Ringing { call }).await;
    deliver(
        client,
        presenter,
        CallNotification::GotMedia(
            MediaInfo::new(call).with_remote_stream(LoopbackCallClient::remote_stream_for(call)),
        ),
    )
    .await;
    deliver(client, presenter, CallNotification::Connected(MediaInfo::new(call))).await;
    call
}

#[tokio::test]
async fn test_outbound_client_call_reaches_dual_video() {
    let (client, mut presenter) = mounted("bob42").await;

    let call = presenter.place_client_call(" anna 123 ").await.unwrap();
    let screen = presenter.screen();
    assert_eq!(screen.body, View::Calling);
    assert_eq!(screen.peer.as_deref(), Some("anna123"));
    assert_eq!(presenter.session().phase, CallPhase::Calling);

    deliver(&client, &mut presenter, CallNotification::Ringing { call }).await;
    assert_eq!(presenter.session().phase, CallPhase::Ringing);

    deliver(
        &client,
        &mut presenter,
        CallNotification::GotMedia(
            MediaInfo::new(call).with_remote_stream(LoopbackCallClient::remote_stream_for(call)),
        ),
    )
    .await;
    assert_eq!(presenter.screen().body, View::Calling);

    deliver(&client, &mut presenter, CallNotification::Connected(MediaInfo::new(call))).await;
    assert_eq!(presenter.screen().body, View::MediaPending);

    // Local stream lookup completes
    step(&mut presenter).await;
    let screen = presenter.screen();
    assert_eq!(screen.body, View::Video(VideoLayout::Dual));
    assert!(matches!(screen.controls, Controls::InCall { media: Some(_) }));
    assert!(presenter.session().connected_at.is_some());

    let commands = client.commands();
    assert!(commands.contains(&ClientCommand::CallClient {
        client_id: "anna123".to_string(),
        call
    }));
    assert!(commands.contains(&ClientCommand::GetLocalStream(call)));
}

#[tokio::test]
async fn test_rejected_incoming_call_waits_for_disconnect() {
    let (client, mut presenter) = mounted("anna123").await;

    let call = client.simulate_incoming("bob42").await;
    step(&mut presenter).await;
    let screen = presenter.screen();
    assert_eq!(screen.body, View::Incoming);
    assert_eq!(screen.controls, Controls::IncomingPrompt);
    assert_eq!(screen.peer.as_deref(), Some("bob42"));

    presenter.reject().await.unwrap();
    assert_eq!(presenter.session().phase, CallPhase::IncomingCall);
    assert!(client.commands().contains(&ClientCommand::Reject(call)));

    deliver(&client, &mut presenter, CallNotification::Disconnected { call: Some(call) }).await;
    assert_eq!(presenter.session().phase, CallPhase::Idle);
    assert_eq!(presenter.screen().body, View::Dial);
}

#[tokio::test]
async fn test_accepted_incoming_call_connects() {
    let (client, mut presenter) = mounted("anna123").await;

    let call = client.simulate_incoming("bob42").await;
    step(&mut presenter).await;
    presenter.accept().await.unwrap();
    assert!(client.commands().contains(&ClientCommand::Answer(call)));

    deliver(
        &client,
        &mut presenter,
        CallNotification::GotMedia(
            MediaInfo::new(call).with_remote_stream(LoopbackCallClient::remote_stream_for(call)),
        ),
    )
    .await;
    deliver(&client, &mut presenter, CallNotification::Connected(MediaInfo::new(call))).await;
    step(&mut presenter).await;
    assert_eq!(presenter.screen().body, View::Video(VideoLayout::Dual));
}

#[tokio::test]
async fn test_second_incoming_call_is_ignored() {
    let (client, mut presenter) = mounted("anna123").await;

    let first = client.simulate_incoming("bob42").await;
    step(&mut presenter).await;
    client.simulate_incoming("carol7").await;
    step(&mut presenter).await;

    assert_eq!(presenter.session().call, Some(first));
    assert_eq!(presenter.screen().peer.as_deref(), Some("bob42"));
}

#[tokio::test]
async fn test_mute_notifications_pick_layout() {
    let (client, mut presenter) = mounted("bob42").await;
    connect_client_call(&client, &mut presenter, "anna123").await;
    step(&mut presenter).await;

    deliver(&client, &mut presenter, CallNotification::RemoteVideoMute).await;
    deliver(&client, &mut presenter, CallNotification::LocalVideoUnmute).await;
    assert_eq!(
        presenter.screen().body,
        View::Video(VideoLayout::LocalWithPlaceholder)
    );

    deliver(&client, &mut presenter, CallNotification::LocalVideoMute).await;
    assert_eq!(presenter.screen().body, View::Video(VideoLayout::Placeholders));
    assert_eq!(presenter.session().phase, CallPhase::Connected);
}

#[tokio::test]
async fn test_local_toggles_reach_call_client() {
    let (client, mut presenter) = mounted("bob42").await;
    let call = connect_client_call(&client, &mut presenter, "anna123").await;
    step(&mut presenter).await;

    presenter.toggle_camera().await.unwrap();
    presenter.toggle_mic().await.unwrap();
    presenter.toggle_speaker().await.unwrap();
    presenter.swap_camera().await.unwrap();

    assert_eq!(presenter.screen().body, View::Video(VideoLayout::RemoteOnly));
    assert!(presenter.screen().speaker_on);

    let mutes: Vec<_> = client
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            ClientCommand::Mute { state, .. } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(mutes.len(), 2);
    assert!(mutes[1].camera_muted && mutes[1].mic_muted);
    assert!(client.commands().contains(&ClientCommand::SetSpeaker(true)));
    assert!(client.commands().contains(&ClientCommand::SwapCam {
        video_muted: true,
        call
    }));
}

#[tokio::test]
async fn test_camera_and_mic_need_connected_client_call() {
    let (client, mut presenter) = mounted("bob42").await;

    let call = presenter.place_client_call("anna123").await.unwrap();
    deliver(&client, &mut presenter, CallNotification::Ringing { call }).await;
    assert_eq!(presenter.screen().controls, Controls::InCall { media: None });
    assert!(matches!(presenter.toggle_camera().await, Err(PresenterError::InvalidState { .. })));
    assert!(matches!(presenter.swap_camera().await, Err(PresenterError::InvalidState { .. })));
    presenter.hang_up().await.unwrap();
    deliver(&client, &mut presenter, CallNotification::Disconnected { call: Some(call) }).await;

    let call = presenter.place_service_call("voicemail").await.unwrap();
    deliver(&client, &mut presenter, CallNotification::Ringing { call }).await;
    deliver(&client, &mut presenter, CallNotification::Connected(MediaInfo::new(call))).await;
    step(&mut presenter).await;
    assert_eq!(presenter.session().phase, CallPhase::Connected);
    assert!(matches!(presenter.toggle_mic().await, Err(PresenterError::InvalidState { .. })));
    assert!(matches!(presenter.toggle_camera().await, Err(PresenterError::InvalidState { .. })));
    assert!(!presenter.session().local_mic_muted);
    assert!(!presenter.session().local_video_muted);

    presenter.toggle_speaker().await.unwrap();
    assert!(client
        .commands()
        .iter()
        .all(|c| !matches!(c, ClientCommand::Mute { .. } | ClientCommand::SwapCam { .. })));
}

#[tokio::test]
async fn test_process_next_ends_without_handler() {
    let client = Arc::new(LoopbackCallClient::new());
    let mut presenter = CallPresenter::new(client.clone(), params("bob42"));
    presenter.refresh().await;
    let ended = timeout(Duration::from_secs(2), presenter.process_next()).await;
    assert_eq!(ended.ok(), Some(false));

    presenter.mount();
    presenter.unmount();
    let ended = timeout(Duration::from_secs(2), presenter.process_next()).await;
    assert_eq!(ended.ok(), Some(false));
}

#[tokio::test]
async fn test_process_next_drains_lookup_after_unmount() {
    let (client, mut presenter) = mounted("bob42").await;
    client.hold_local_streams();
    let call = connect_client_call(&client, &mut presenter, "anna123").await;

    presenter.unmount();
    client.release_local_streams();
    step(&mut presenter).await;
    let local = presenter.session().local_stream.as_ref().expect("local stream bound");
    assert!(local.url.ends_with(&call.to_string()));

    let ended = timeout(Duration::from_secs(2), presenter.process_next()).await;
    assert_eq!(ended.ok(), Some(false));
}

#[tokio::test]
async fn test_stale_local_stream_is_discarded() {
    let (client, mut presenter) = mounted("bob42").await;
    client.hold_local_streams();

    let first = connect_client_call(&client, &mut presenter, "anna123").await;
    deliver(&client, &mut presenter, CallNotification::Disconnected { call: Some(first) }).await;
    assert_eq!(presenter.session().phase, CallPhase::Idle);

    let second = connect_client_call(&client, &mut presenter, "carol7").await;
    client.release_local_streams();

    // Both lookups complete; only the one for the current session may land
    step(&mut presenter).await;
    step(&mut presenter).await;

    let session = presenter.session();
    assert_eq!(session.call, Some(second));
    let local = session.local_stream.as_ref().expect("local stream bound");
    assert!(local.url.ends_with(&second.to_string()));
    assert!(!local.url.ends_with(&first.to_string()));
}

#[tokio::test]
async fn test_local_stream_after_disconnect_is_dropped() {
    let (client, mut presenter) = mounted("bob42").await;
    client.hold_local_streams();

    let call = connect_client_call(&client, &mut presenter, "anna123").await;
    deliver(&client, &mut presenter, CallNotification::Disconnected { call: Some(call) }).await;
    client.release_local_streams();
    step(&mut presenter).await;

    assert_eq!(presenter.session().phase, CallPhase::Idle);
    assert!(presenter.session().local_stream.is_none());
    assert_eq!(presenter.screen().body, View::Dial);
}

#[tokio::test]
async fn test_empty_identifier_never_reaches_call_client() {
    let (client, mut presenter) = mounted("bob42").await;
    let before = client.commands().len();

    assert!(matches!(
        presenter.place_client_call("   ").await,
        Err(PresenterError::EmptyPeerId)
    ));
    assert!(matches!(
        presenter.place_service_call("").await,
        Err(PresenterError::EmptyPeerId)
    ));

    assert_eq!(client.commands().len(), before);
    assert_eq!(presenter.session().phase, CallPhase::Idle);
}

#[tokio::test]
async fn test_failed_placement_rolls_back() {
    let (client, mut presenter) = mounted("bob42").await;
    client.set_fail_calls(true);

    let id_before = presenter.session().id;
    assert!(presenter.place_client_call("anna123").await.is_err());
    assert_eq!(presenter.session().phase, CallPhase::Idle);
    assert!(presenter.session().id > id_before);
    assert_eq!(presenter.screen().body, View::Dial);
}

#[tokio::test]
async fn test_second_placement_is_rejected() {
    let (_client, mut presenter) = mounted("bob42").await;
    presenter.place_client_call("anna123").await.unwrap();
    assert!(matches!(
        presenter.place_service_call("voicemail").await,
        Err(PresenterError::InvalidState { .. })
    ));
    assert_eq!(presenter.screen().peer.as_deref(), Some("anna123"));
}

#[tokio::test]
async fn test_registration_failure_is_retried() {
    let client = Arc::new(LoopbackCallClient::new());
    client.set_accept_registration(false);
    let mut presenter = CallPresenter::new(client.clone(), params("bob42"));
    presenter.mount();

    assert_eq!(presenter.refresh().await.body, View::CredentialsMissing);
    assert_eq!(presenter.registration(), &RegistrationState::Failed { attempts: 1 });
    assert!(matches!(
        presenter.place_client_call("anna123").await,
        Err(PresenterError::NotRegistered)
    ));

    presenter.refresh().await;
    assert_eq!(presenter.registration(), &RegistrationState::Failed { attempts: 2 });

    client.set_accept_registration(true);
    let screen = presenter.refresh().await;
    assert_eq!(screen.body, View::Dial);
    assert_eq!(screen.header.registered_as.as_deref(), Some("bob42"));

    // Registered clients are not registered again
    presenter.refresh().await;
    let registers = client
        .commands()
        .iter()
        .filter(|c| matches!(c, ClientCommand::Register { .. }))
        .count();
    assert_eq!(registers, 3);
}

#[tokio::test]
async fn test_mount_is_idempotent_and_released_on_drop() {
    let client = Arc::new(LoopbackCallClient::new());
    let mut presenter = CallPresenter::new(client.clone(), params("bob42"));

    presenter.mount();
    presenter.mount();
    assert!(presenter.is_mounted());
    assert!(client.has_subscriber());

    drop(presenter);
    assert!(!client.has_subscriber());
}

#[tokio::test]
async fn test_stale_unmount_keeps_newer_handler() {
    let client = Arc::new(LoopbackCallClient::new());
    let mut first = CallPresenter::new(client.clone(), params("bob42"));
    first.mount();
    let mut second = CallPresenter::new(client.clone(), params("bob42"));
    second.mount();

    drop(first);
    assert!(client.has_subscriber());
    second.unmount();
    assert!(!client.has_subscriber());
}

#[tokio::test]
async fn test_service_call_dtmf() {
    let (client, mut presenter) = mounted("bob42").await;

    assert!(matches!(
        presenter.send_dtmf('5').await,
        Err(PresenterError::NoActiveCall | PresenterError::InvalidState { .. })
    ));

    let call = presenter.place_service_call("voicemail").await.unwrap();
    assert_eq!(presenter.screen().body, View::Keypad { calling: true });
    assert!(presenter.send_dtmf('1').await.is_err());

    deliver(&client, &mut presenter, CallNotification::Ringing { call }).await;
    deliver(&client, &mut presenter, CallNotification::GotMedia(MediaInfo::new(call))).await;
    deliver(&client, &mut presenter, CallNotification::Connected(MediaInfo::new(call))).await;
    step(&mut presenter).await;
    assert_eq!(presenter.screen().body, View::Keypad { calling: false });

    presenter.send_dtmf('5').await.unwrap();
    presenter.send_dtmf('#').await.unwrap();
    assert!(matches!(
        presenter.send_dtmf('x').await,
        Err(PresenterError::InvalidDtmf { digit: 'x' })
    ));

    let digits: Vec<char> = client
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            ClientCommand::SendDtmf { digit, .. } => Some(digit),
            _ => None,
        })
        .collect();
    assert_eq!(digits, vec!['5', '#']);
}

#[tokio::test]
async fn test_hang_up_then_unregister() {
    let (client, mut presenter) = mounted("bob42").await;
    let call = presenter.place_client_call("anna123").await.unwrap();
    assert!(!presenter.screen().header.show_settings);

    presenter.hang_up().await.unwrap();
    assert!(client.commands().contains(&ClientCommand::StopCall(call)));
    deliver(&client, &mut presenter, CallNotification::Disconnected { call: Some(call) }).await;
    assert!(presenter.screen().header.show_settings);

    presenter.unregister().await.unwrap();
    assert!(!client.has_subscriber());
    assert_eq!(client.commands().last(), Some(&ClientCommand::Unregister));
}

#[tokio::test]
async fn test_auto_progress_drives_call_to_video() {
    let config = softphone_presenter::LoopbackConfig {
        auto_progress: true,
        step_delay_ms: 1,
        accept_registration: true,
    };
    let client = Arc::new(LoopbackCallClient::from_config(&config));
    let mut presenter = CallPresenter::new(client.clone(), params("bob42"));
    presenter.mount();
    presenter.refresh().await;

    presenter.place_client_call("anna123").await.unwrap();
    // ringing, got media, connected, local stream
    for _ in 0..4 {
        step(&mut presenter).await;
    }
    assert_eq!(presenter.screen().body, View::Video(VideoLayout::Dual));
}
