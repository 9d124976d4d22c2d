//! Text rendering of the call screen

use std::fmt::Write;

use softphone_presenter::{
    Controls, CredentialsForm, Header, Screen, StreamHandle, VideoLayout, View, KEYPAD,
};

pub fn render(screen: &Screen) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header_line(&screen.header));
    let _ = writeln!(out, "{}", body(screen));
    let controls = controls_line(&screen.controls, screen.speaker_on);
    if !controls.is_empty() {
        let _ = writeln!(out, "{}", controls);
    }
    out
}

fn header_line(header: &Header) -> String {
    let who = match &header.registered_as {
        Some(client_id) => format!("registered as {}", client_id),
        None => "not registered".to_string(),
    };
    let direction = if header.outbound {
        " (outbound)"
    } else if header.inbound {
        " (inbound)"
    } else {
        ""
    };
    let settings = if header.show_settings { "  [back]" } else { "" };
    format!("== {} | {}{}{}", who, header.phase, direction, settings)
}

fn body(screen: &Screen) -> String {
    let peer = screen.peer.as_deref().unwrap_or("?");
    match screen.body {
        View::CredentialsMissing => {
            "Registration failed. Check your credentials (back) and try again.".to_string()
        }
        View::Dial => "Dial: call <client id> | service <name>".to_string(),
        View::Calling => format!("Calling {} ...", peer),
        View::Incoming => format!("Incoming call from {}", peer),
        View::Keypad { calling } => {
            let mut out = if calling {
                format!("Calling {} ...\n", peer)
            } else {
                format!("{}\n", peer)
            };
            for row in KEYPAD {
                let keys: Vec<String> = row.iter().map(|k| format!("[{}]", k)).collect();
                let _ = writeln!(out, "  {}", keys.join(" "));
            }
            out.trim_end().to_string()
        }
        View::MediaPending => format!("Connected to {}, waiting for media ...", peer),
        View::Video(layout) => video(layout, screen),
    }
}

fn video(layout: VideoLayout, screen: &Screen) -> String {
    let url = |stream: &Option<StreamHandle>| stream.as_ref().map(|s| s.url.clone()).unwrap_or_default();
    let remote = if layout.shows_remote() {
        format!("remote video <{}>", url(&screen.remote_stream))
    } else {
        "[no video]".to_string()
    };
    let local = if layout.shows_local() {
        format!("self view <{}>", url(&screen.local_stream))
    } else {
        "[camera off]".to_string()
    };
    format!("{} + {}", remote, local)
}

fn controls_line(controls: &Controls, speaker_on: bool) -> String {
    match controls {
        Controls::None => String::new(),
        Controls::IncomingPrompt => "[reject] [accept]".to_string(),
        Controls::InCall { media } => {
            let speaker = if speaker_on { "speaker:on" } else { "speaker:off" };
            let mut line = format!("[hangup] [{}]", speaker);
            if let Some(media) = media {
                let camera = if media.video_muted { "camera:off" } else { "camera:on" };
                let mic = if media.mic_muted { "mic:off" } else { "mic:on" };
                let _ = write!(line, " [swap] [{}] [{}]", camera, mic);
            }
            line
        }
    }
}

/// Summary of the credentials screen
pub fn render_credentials(form: &CredentialsForm) -> String {
    let mut out = String::from("== Credentials\n");
    let _ = writeln!(out, "  client id : {}", form.register_client_id());
    let _ = writeln!(out, "  region    : {}", form.cloud_region_id());
    let _ = writeln!(out, "  username  : {}", form.cloud_username());
    let _ = writeln!(out, "  log level : {}", form.log_level());
    let token = if form.has_token() { "issued" } else { "none" };
    let _ = writeln!(out, "  token     : {}", token);
    let missing = form.missing_fields();
    if !missing.is_empty() {
        let _ = writeln!(out, "  missing   : {}", missing.join(", "));
    }
    out
}
