//! Error types for the call-session presenter

use thiserror::Error;

/// Result type for presenter operations
pub type PresenterResult<T> = Result<T, PresenterError>;

/// Errors that can occur while presenting a call session
#[derive(Debug, Error)]
pub enum PresenterError {
    /// The collaborator returned no client for the given credentials
    #[error("Registration failed for client {client_id}")]
    RegistrationFailed { client_id: String },

    /// No registered client is available for the requested action
    #[error("Client is not registered")]
    NotRegistered,

    /// The peer identifier was empty once whitespace was removed
    #[error("Peer identifier is empty")]
    EmptyPeerId,

    /// The action is not valid in the current session phase
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// The action needs a call handle but no call is active
    #[error("No active call")]
    NoActiveCall,

    /// The character is not a DTMF digit
    #[error("Invalid DTMF digit: {digit:?}")]
    InvalidDtmf { digit: char },

    /// The call-client collaborator reported a failure
    #[error("Call client error: {message}")]
    Collaborator { message: String },

    /// Installing or releasing the notification handler failed
    #[error("Subscription error: {message}")]
    Subscription { message: String },

    /// The token service could not issue a token
    #[error("Token unavailable: {message}")]
    TokenUnavailable { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl PresenterError {
    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a collaborator error
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
        }
    }

    /// Create a subscription error
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription {
            message: message.into(),
        }
    }

    /// Create a token error
    pub fn token(message: impl Into<String>) -> Self {
        Self::TokenUnavailable {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error was raised locally without contacting the collaborator
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            Self::EmptyPeerId
                | Self::InvalidState { .. }
                | Self::NoActiveCall
                | Self::InvalidDtmf { .. }
                | Self::NotRegistered
        )
    }
}
