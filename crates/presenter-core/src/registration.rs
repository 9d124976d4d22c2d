//! Registration with the call client and token issuance contracts
//!
//! Registration is delegated entirely to the call client; this module only
//! describes what is handed over and what the presenter remembers about the
//! outcome. Tokens come from a separate cloud service reached through
//! [`TokenService`].

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PresenterResult;

/// Parameters passed to the call client's `register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationParams {
    /// Cloud region identifier (e.g. "0-2-0")
    pub cloud_region_id: String,
    /// WebRTC access key for the cloud account
    pub webrtc_access_key: String,
    /// Client id this device registers as
    pub register_client_id: String,
    /// Call-client log level, passed through verbatim
    pub log_level: String,
    /// Token issued by the registration service
    pub webrtc_token: String,
}

/// Evidence of a successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredClient {
    pub client_id: String,
    pub registered_at: DateTime<Utc>,
}

impl RegisteredClient {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            registered_at: Utc::now(),
        }
    }
}

/// Where the presenter stands with the call client
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegistrationState {
    /// No attempt made yet, or unregistered on purpose
    #[default]
    Unregistered,
    /// A register call is in flight
    Registering,
    Registered(RegisteredClient),
    /// The last attempt returned no client; retried on the next refresh
    Failed { attempts: u32 },
}

impl RegistrationState {
    pub fn client(&self) -> Option<&RegisteredClient> {
        match self {
            RegistrationState::Registered(client) => Some(client),
            _ => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.client().is_some()
    }

    /// Whether a refresh should issue a register call
    pub fn needs_attempt(&self) -> bool {
        matches!(
            self,
            RegistrationState::Unregistered | RegistrationState::Failed { .. }
        )
    }

    pub fn failed_attempts(&self) -> u32 {
        match self {
            RegistrationState::Failed { attempts } => *attempts,
            _ => 0,
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationState::Unregistered => write!(f, "unregistered"),
            RegistrationState::Registering => write!(f, "registering"),
            RegistrationState::Registered(client) => write!(f, "registered as {}", client.client_id),
            RegistrationState::Failed { attempts } => {
                write!(f, "registration failed ({} attempts)", attempts)
            }
        }
    }
}

/// Request sent to the token service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub register_client_id: String,
    /// Token lifetime in seconds
    pub token_life_time: u32,
    pub enable_incoming_call: bool,
    /// Which client ids the token may call ("*" for any)
    pub call_client_range: String,
    pub cloud_region_id: String,
    pub cloud_username: String,
    pub api_access_key: String,
}

/// Issues WebRTC tokens for registration
///
/// `Ok(None)` means the service answered but refused the credentials.
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn get_token(&self, request: &TokenRequest) -> PresenterResult<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_state_queries() {
        let state = RegistrationState::default();
        assert!(state.needs_attempt());
        assert!(!state.is_registered());

        let state = RegistrationState::Registering;
        assert!(!state.needs_attempt());

        let state = RegistrationState::Failed { attempts: 2 };
        assert!(state.needs_attempt());
        assert_eq!(state.failed_attempts(), 2);

        let state = RegistrationState::Registered(RegisteredClient::new("anna123"));
        assert!(!state.needs_attempt());
        assert_eq!(state.client().map(|c| c.client_id.as_str()), Some("anna123"));
        assert_eq!(state.to_string(), "registered as anna123");
    }

    #[test]
    fn test_token_request_serialization() {
        let request = TokenRequest {
            register_client_id: "anna123".into(),
            token_life_time: 3600,
            enable_incoming_call: true,
            call_client_range: "*".into(),
            cloud_region_id: "0-2-0".into(),
            cloud_username: "anna@example.com".into(),
            api_access_key: "key".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["token_life_time"], 3600);
        assert_eq!(json["call_client_range"], "*");
    }
}
