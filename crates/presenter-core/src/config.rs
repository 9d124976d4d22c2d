//! Configuration for the softphone front end
//!
//! A [`SoftphoneConfig`] is read from TOML. Every section has defaults, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! [credentials]
//! cloud_region_id = "0-2-0"
//! register_client_id = "anna123"
//! log_level = "2"
//!
//! [token]
//! token_life_time = 3600
//!
//! [loopback]
//! auto_progress = true
//! step_delay_ms = 400
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PresenterError, PresenterResult};

/// Pre-filled values for the credentials screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialDefaults {
    pub webrtc_access_key: String,
    pub api_access_key: String,
    pub cloud_region_id: String,
    pub cloud_username: String,
    pub log_level: String,
    pub register_client_id: String,
}

/// Fixed parameters of every token request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPolicy {
    /// Token lifetime in seconds
    pub token_life_time: u32,
    pub enable_incoming_call: bool,
    pub call_client_range: String,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            token_life_time: 3600,
            enable_incoming_call: true,
            call_client_range: "*".to_string(),
        }
    }
}

/// Behaviour of the in-process loopback call client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopbackConfig {
    /// Walk outbound and answered calls through ringing, media and connected
    pub auto_progress: bool,
    /// Pause between simulated notifications
    pub step_delay_ms: u64,
    /// Answer `register` with a client
    pub accept_registration: bool,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            auto_progress: true,
            step_delay_ms: 400,
            accept_registration: true,
        }
    }
}

impl LoopbackConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Complete front-end configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftphoneConfig {
    pub credentials: CredentialDefaults,
    pub token: TokenPolicy,
    pub loopback: LoopbackConfig,
}

impl SoftphoneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(input: &str) -> PresenterResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> PresenterResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> PresenterResult<()> {
        if self.token.token_life_time == 0 {
            return Err(PresenterError::config("token_life_time must be positive"));
        }
        if self.token.call_client_range.trim().is_empty() {
            return Err(PresenterError::config("call_client_range must not be empty"));
        }
        Ok(())
    }

    pub fn with_register_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.credentials.register_client_id = client_id.into();
        self
    }

    pub fn with_cloud_region_id(mut self, region: impl Into<String>) -> Self {
        self.credentials.cloud_region_id = region.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.credentials.log_level = level.into();
        self
    }

    pub fn with_auto_progress(mut self, enabled: bool) -> Self {
        self.loopback.auto_progress = enabled;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.loopback.step_delay_ms = delay.as_millis() as u64;
        self
    }
}
