//! Command-line arguments

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use softphone_presenter::SoftphoneConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal softphone over a loopback call client", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "SOFTPHONE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Client id to register as
    #[arg(long, env = "SOFTPHONE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Cloud region identifier
    #[arg(long, env = "SOFTPHONE_REGION")]
    pub region: Option<String>,

    /// Cloud account user name
    #[arg(long, env = "SOFTPHONE_CLOUD_USERNAME")]
    pub username: Option<String>,

    /// API access key used for token requests
    #[arg(long, env = "SOFTPHONE_API_KEY")]
    pub api_key: Option<String>,

    /// WebRTC access key passed to registration
    #[arg(long, env = "SOFTPHONE_WEBRTC_KEY")]
    pub webrtc_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "SOFTPHONE_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Include file and line in log lines
    #[arg(long)]
    pub log_file_info: bool,

    /// Do not advance calls automatically; drive them with `remote` commands
    #[arg(long)]
    pub manual: bool,
}

impl Args {
    /// Load the configuration file (if any) and overlay the flags
    pub fn load_config(&self) -> Result<SoftphoneConfig> {
        let mut config = match &self.config {
            Some(path) => SoftphoneConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => SoftphoneConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut SoftphoneConfig) {
        let credentials = &mut config.credentials;
        let overrides = [
            (&self.client_id, &mut credentials.register_client_id),
            (&self.region, &mut credentials.cloud_region_id),
            (&self.username, &mut credentials.cloud_username),
            (&self.api_key, &mut credentials.api_access_key),
            (&self.webrtc_key, &mut credentials.webrtc_access_key),
        ];
        for (flag, field) in overrides {
            if let Some(value) = flag {
                *field = value.clone();
            }
        }
        if self.manual {
            config.loopback.auto_progress = false;
        }
    }
}
