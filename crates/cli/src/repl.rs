//! Command parsing for the two interactive screens

use std::str::FromStr;

use anyhow::{anyhow, bail};

/// Editable credential field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ClientId,
    Region,
    Username,
    ApiKey,
    WebrtcKey,
    LogLevel,
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client-id" | "id" => Ok(Field::ClientId),
            "region" => Ok(Field::Region),
            "username" | "user" => Ok(Field::Username),
            "api-key" => Ok(Field::ApiKey),
            "webrtc-key" => Ok(Field::WebrtcKey),
            "log-level" => Ok(Field::LogLevel),
            other => Err(anyhow!("unknown field '{}'", other)),
        }
    }
}

/// Input on the credentials screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsCommand {
    Set { field: Field, value: String },
    Token,
    Register,
    Help,
    Quit,
}

impl FromStr for CredentialsCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (word, rest) = split_command(s);
        match word {
            "set" => {
                let (field, value) = split_command(rest);
                if field.is_empty() {
                    bail!("usage: set <field> <value>");
                }
                Ok(CredentialsCommand::Set {
                    field: field.parse()?,
                    value: value.to_string(),
                })
            }
            "token" => Ok(CredentialsCommand::Token),
            "register" | "go" => Ok(CredentialsCommand::Register),
            "help" | "?" => Ok(CredentialsCommand::Help),
            "quit" | "exit" => Ok(CredentialsCommand::Quit),
            other => Err(anyhow!("unknown command '{}', try help", other)),
        }
    }
}

pub const CREDENTIALS_HELP: &str = "\
set <client-id|region|username|api-key|webrtc-key|log-level> <value>
token      request a token
register   request a token if needed and open the call screen
quit";

/// Simulated event from the far end, delivered through the loopback client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    Incoming(String),
    Ring,
    Media,
    Connect,
    Hangup,
    VideoMute,
    VideoUnmute,
}

/// Input on the call screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallCommand {
    Call(String),
    Service(String),
    Accept,
    Reject,
    HangUp,
    Speaker,
    Camera,
    Mic,
    Swap,
    Dtmf(String),
    Remote(RemoteEvent),
    Back,
    Help,
    Quit,
}

impl FromStr for CallCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (word, rest) = split_command(s);
        let command = match word {
            "call" => CallCommand::Call(rest.to_string()),
            "service" => CallCommand::Service(rest.to_string()),
            "accept" | "answer" => CallCommand::Accept,
            "reject" => CallCommand::Reject,
            "hangup" | "bye" => CallCommand::HangUp,
            "speaker" => CallCommand::Speaker,
            "camera" | "video" => CallCommand::Camera,
            "mic" => CallCommand::Mic,
            "swap" => CallCommand::Swap,
            "dtmf" => {
                if rest.is_empty() {
                    bail!("usage: dtmf <digits>");
                }
                CallCommand::Dtmf(rest.to_string())
            }
            "remote" => CallCommand::Remote(rest.parse()?),
            "back" | "settings" => CallCommand::Back,
            "help" | "?" => CallCommand::Help,
            "quit" | "exit" => CallCommand::Quit,
            other => bail!("unknown command '{}', try help", other),
        };
        Ok(command)
    }
}

impl FromStr for RemoteEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (word, rest) = split_command(s);
        match word {
            "incoming" if !rest.is_empty() => Ok(RemoteEvent::Incoming(rest.to_string())),
            "incoming" => bail!("usage: remote incoming <caller id>"),
            "ring" => Ok(RemoteEvent::Ring),
            "media" => Ok(RemoteEvent::Media),
            "connect" => Ok(RemoteEvent::Connect),
            "hangup" => Ok(RemoteEvent::Hangup),
            "video-mute" => Ok(RemoteEvent::VideoMute),
            "video-unmute" => Ok(RemoteEvent::VideoUnmute),
            other => Err(anyhow!("unknown remote event '{}'", other)),
        }
    }
}

pub const CALL_HELP: &str = "\
call <client id>      service <name>
accept | reject | hangup
speaker | camera | mic | swap | dtmf <digits>
remote incoming <caller> | ring | media | connect | hangup | video-mute | video-unmute
back (idle only) | quit";

fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    }
}
