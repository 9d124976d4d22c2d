//! Credentials screen
//!
//! Collects the cloud account fields, obtains a WebRTC token and hands the
//! resulting [`RegistrationParams`] to the call screen. Every field is stored
//! with all whitespace removed.

use tracing::{error, info, warn};

use crate::config::{CredentialDefaults, TokenPolicy};
use crate::error::{PresenterError, PresenterResult};
use crate::registration::{RegistrationParams, TokenRequest, TokenService};
use crate::types::delete_spaces;

/// Editable state of the credentials screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialsForm {
    webrtc_access_key: String,
    api_access_key: String,
    cloud_region_id: String,
    cloud_username: String,
    log_level: String,
    register_client_id: String,
    token: Option<String>,
    policy: TokenPolicy,
}

impl CredentialsForm {
    pub fn new(policy: TokenPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Pre-fill the form from configuration
    pub fn from_defaults(defaults: &CredentialDefaults, policy: TokenPolicy) -> Self {
        let mut form = Self::new(policy);
        form.set_webrtc_access_key(&defaults.webrtc_access_key);
        form.set_api_access_key(&defaults.api_access_key);
        form.set_cloud_region_id(&defaults.cloud_region_id);
        form.set_cloud_username(&defaults.cloud_username);
        form.set_log_level(&defaults.log_level);
        form.set_register_client_id(&defaults.register_client_id);
        form
    }

    pub fn set_webrtc_access_key(&mut self, value: &str) {
        self.webrtc_access_key = delete_spaces(value);
    }

    pub fn set_api_access_key(&mut self, value: &str) {
        self.api_access_key = delete_spaces(value);
    }

    pub fn set_cloud_region_id(&mut self, value: &str) {
        self.cloud_region_id = delete_spaces(value);
    }

    pub fn set_cloud_username(&mut self, value: &str) {
        self.cloud_username = delete_spaces(value);
    }

    pub fn set_log_level(&mut self, value: &str) {
        self.log_level = delete_spaces(value);
    }

    /// Changing the client id invalidates any token issued for the old one
    pub fn set_register_client_id(&mut self, value: &str) {
        let client_id = delete_spaces(value);
        if client_id != self.register_client_id {
            self.token = None;
        }
        self.register_client_id = client_id;
    }

    pub fn register_client_id(&self) -> &str {
        &self.register_client_id
    }

    pub fn cloud_region_id(&self) -> &str {
        &self.cloud_region_id
    }

    pub fn cloud_username(&self) -> &str {
        &self.cloud_username
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Names of the fields that still need a value before a token request
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("register_client_id", &self.register_client_id),
            ("cloud_region_id", &self.cloud_region_id),
            ("cloud_username", &self.cloud_username),
            ("api_access_key", &self.api_access_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn token_request(&self) -> TokenRequest {
        TokenRequest {
            register_client_id: self.register_client_id.clone(),
            token_life_time: self.policy.token_life_time,
            enable_incoming_call: self.policy.enable_incoming_call,
            call_client_range: self.policy.call_client_range.clone(),
            cloud_region_id: self.cloud_region_id.clone(),
            cloud_username: self.cloud_username.clone(),
            api_access_key: self.api_access_key.clone(),
        }
    }

    /// Ask the token service for a token and keep it on success
    ///
    /// A refusal leaves any previous token in place and is reported as
    /// [`PresenterError::TokenUnavailable`].
    pub async fn request_token(&mut self, service: &dyn TokenService) -> PresenterResult<()> {
        let request = self.token_request();
        match service.get_token(&request).await {
            Ok(Some(token)) => {
                info!("Token issued for {}", self.register_client_id);
                self.token = Some(token);
                Ok(())
            }
            Ok(None) => {
                warn!("Token service refused credentials for {}", self.register_client_id);
                Err(PresenterError::token("token service returned no token"))
            }
            Err(e) => {
                error!("Token request for {} failed: {}", self.register_client_id, e);
                Err(PresenterError::token(e.to_string()))
            }
        }
    }

    /// Build registration parameters and consume the token
    ///
    /// Returning to this screen later requires a fresh token.
    pub fn take_registration(&mut self) -> PresenterResult<RegistrationParams> {
        if self.register_client_id.is_empty() {
            return Err(PresenterError::EmptyPeerId);
        }
        let webrtc_token = self
            .token
            .take()
            .ok_or_else(|| PresenterError::token("request a token first"))?;
        Ok(RegistrationParams {
            cloud_region_id: self.cloud_region_id.clone(),
            webrtc_access_key: self.webrtc_access_key.clone(),
            register_client_id: self.register_client_id.clone(),
            log_level: self.log_level.clone(),
            webrtc_token,
        })
    }
}
