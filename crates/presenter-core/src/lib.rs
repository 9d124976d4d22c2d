//! Softphone presenter: call-session state and view selection
//!
//! This crate drives the call screen of a WebRTC softphone. It sits between a
//! user-facing shell and an external call client that owns signaling and
//! media.
//!
//! ## Layering
//! ```text
//! shell (cli) -> CallPresenter -> reduce / select_view
//!                      |
//!                      v
//!               CallClient (external) --notifications--> CallPresenter
//! ```
//!
//! The presenter focuses on:
//! - Tracking one call session through its phases
//! - Discarding local-stream lookups that belong to an older session
//! - Selecting exactly one body view, header and button row per render
//! - Collecting credentials and a token before registration
//!
//! [`LoopbackCallClient`] and [`LoopbackTokenService`] stand in for the cloud
//! services in tests and in the command-line shell.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod loopback;
pub mod presenter;
pub mod reducer;
pub mod registration;
pub mod session;
pub mod types;
pub mod view;

pub use client::CallClient;
pub use config::{CredentialDefaults, LoopbackConfig, SoftphoneConfig, TokenPolicy};
pub use credentials::CredentialsForm;
pub use error::{PresenterError, PresenterResult};
pub use events::{
    CallEventHandler, CallNotification, IncomingCallInfo, MediaInfo, NotificationHub, SubscriptionId,
};
pub use loopback::{ClientCommand, LoopbackCallClient, LoopbackTokenService};
pub use presenter::CallPresenter;
pub use reducer::{reduce, Effect, Outcome, SessionInput, Transition};
pub use registration::{
    RegisteredClient, RegistrationParams, RegistrationState, TokenRequest, TokenService,
};
pub use session::Session;
pub use types::{
    CallDirection, CallHandle, CallPhase, CallType, DtmfDigit, MuteState, PeerId, SessionId,
    StreamHandle, KEYPAD,
};
pub use view::{
    select_controls, select_view, Controls, Header, MediaControls, Screen, VideoLayout, View,
    ViewInputs,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
