//! Interactive credentials and call screens

use std::sync::Arc;

use anyhow::Result;
use softphone_presenter::{
    CallNotification, CallPresenter, CredentialsForm, LoopbackCallClient, MediaInfo,
    PresenterError, PresenterResult, RegistrationParams, TokenService,
};
use tokio::io::{AsyncBufRead, Lines};
use tracing::{debug, warn};

use crate::render::{render, render_credentials};
use crate::repl::{CallCommand, CredentialsCommand, Field, RemoteEvent, CALL_HELP, CREDENTIALS_HELP};

/// How the call screen was left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Back,
    Quit,
}

/// Run the credentials screen until registration parameters are ready
///
/// Returns `None` when the user quits or input ends.
pub async fn credentials_screen<R>(
    form: &mut CredentialsForm,
    tokens: &dyn TokenService,
    lines: &mut Lines<R>,
) -> Result<Option<RegistrationParams>>
where
    R: AsyncBufRead + Unpin,
{
    println!("{}", render_credentials(form));
    loop {
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<CredentialsCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("! {}", e);
                continue;
            }
        };
        match command {
            CredentialsCommand::Set { field, value } => {
                set_field(form, field, &value);
                println!("{}", render_credentials(form));
            }
            CredentialsCommand::Token => report(form.request_token(tokens).await),
            CredentialsCommand::Register => {
                if !form.has_token() {
                    if let Err(e) = form.request_token(tokens).await {
                        println!("! {}", e);
                        continue;
                    }
                }
                match form.take_registration() {
                    Ok(params) => return Ok(Some(params)),
                    Err(e) => println!("! {}", e),
                }
            }
            CredentialsCommand::Help => println!("{}", CREDENTIALS_HELP),
            CredentialsCommand::Quit => return Ok(None),
        }
    }
}

fn set_field(form: &mut CredentialsForm, field: Field, value: &str) {
    match field {
        Field::ClientId => form.set_register_client_id(value),
        Field::Region => form.set_cloud_region_id(value),
        Field::Username => form.set_cloud_username(value),
        Field::ApiKey => form.set_api_access_key(value),
        Field::WebrtcKey => form.set_webrtc_access_key(value),
        Field::LogLevel => form.set_log_level(value),
    }
}

enum Input {
    Line(Option<String>),
    Applied(bool),
}

/// Run the call screen until the user goes back or quits
pub async fn call_screen<R>(
    presenter: &mut CallPresenter,
    client: &Arc<LoopbackCallClient>,
    lines: &mut Lines<R>,
) -> Result<Exit>
where
    R: AsyncBufRead + Unpin,
{
    presenter.mount();
    print!("{}", render(&presenter.refresh().await));

    // Cleared once the presenter has nothing left to deliver; a command may start more
    let mut listening = true;
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            more = presenter.process_next(), if listening => Input::Applied(more),
        };
        match input {
            Input::Applied(true) => print!("{}", render(&presenter.screen())),
            Input::Applied(false) => {
                debug!("Presenter input closed, reading commands only");
                listening = false;
            }
            Input::Line(None) => return Ok(Exit::Quit),
            Input::Line(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<CallCommand>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("! {}", e);
                        continue;
                    }
                };
                if let Some(exit) = run_call_command(presenter, client, command).await {
                    return Ok(exit);
                }
                listening = true;
                print!("{}", render(&presenter.refresh().await));
            }
        }
    }
}

async fn run_call_command(
    presenter: &mut CallPresenter,
    client: &LoopbackCallClient,
    command: CallCommand,
) -> Option<Exit> {
    match command {
        CallCommand::Call(peer) => report(presenter.place_client_call(&peer).await),
        CallCommand::Service(name) => report(presenter.place_service_call(&name).await),
        CallCommand::Accept => report(presenter.accept().await),
        CallCommand::Reject => report(presenter.reject().await),
        CallCommand::HangUp => report(presenter.hang_up().await),
        CallCommand::Speaker => report(presenter.toggle_speaker().await),
        CallCommand::Camera => report(presenter.toggle_camera().await),
        CallCommand::Mic => report(presenter.toggle_mic().await),
        CallCommand::Swap => report(presenter.swap_camera().await),
        CallCommand::Dtmf(digits) => {
            for key in digits.chars().filter(|c| !c.is_whitespace()) {
                if let Err(e) = presenter.send_dtmf(key).await {
                    report::<()>(Err(e));
                    break;
                }
            }
        }
        CallCommand::Remote(event) => remote(presenter, client, event).await,
        CallCommand::Back => {
            if presenter.session().is_active() {
                println!("! settings are only available while idle");
            } else {
                return Some(Exit::Back);
            }
        }
        CallCommand::Help => println!("{}", CALL_HELP),
        CallCommand::Quit => return Some(Exit::Quit),
    }
    None
}

async fn remote(presenter: &CallPresenter, client: &LoopbackCallClient, event: RemoteEvent) {
    let notification = match event {
        RemoteEvent::Incoming(caller) => {
            client.simulate_incoming(&caller).await;
            return;
        }
        RemoteEvent::VideoMute => CallNotification::RemoteVideoMute,
        RemoteEvent::VideoUnmute => CallNotification::RemoteVideoUnmute,
        RemoteEvent::Hangup => CallNotification::Disconnected {
            call: presenter.session().call,
        },
        RemoteEvent::Ring | RemoteEvent::Media | RemoteEvent::Connect => {
            let Some(call) = presenter.session().call else {
                println!("! no call to advance");
                return;
            };
            match event {
                RemoteEvent::Ring => CallNotification::Ringing { call },
                RemoteEvent::Media => CallNotification::GotMedia(
                    MediaInfo::new(call).with_remote_stream(LoopbackCallClient::remote_stream_for(call)),
                ),
                _ => CallNotification::Connected(MediaInfo::new(call)),
            }
        }
    };
    client.emit(notification).await;
}

fn report<T>(result: PresenterResult<T>) {
    match result {
        Ok(_) => {}
        Err(e) if e.is_local_rejection() => println!("! {}", e),
        Err(e) => {
            warn!("Call client request failed: {}", e);
            println!("! {}", e);
        }
    }
}

/// Leave the call screen, releasing the registration
pub async fn leave(presenter: CallPresenter) -> Result<()> {
    match presenter.unregister().await {
        Ok(()) => Ok(()),
        Err(e @ PresenterError::InvalidState { .. }) => {
            println!("! {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
