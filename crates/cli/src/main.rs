//! Terminal softphone
//!
//! Walks through the credentials screen, then the call screen, over the
//! in-process loopback call client. Going back from an idle call screen
//! unregisters and returns to credentials.

mod args;
mod logging;
mod render;
mod repl;
mod shell;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use softphone_presenter::{CallPresenter, CredentialsForm, LoopbackCallClient, LoopbackTokenService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::args::Args;
use crate::logging::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
use crate::shell::{call_screen, credentials_screen, leave, Exit};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut logging = LoggingConfig::new(parse_log_level(&args.log_level)?, "softphone").with_json(args.json_logs);
    if args.log_file_info {
        logging = logging.with_file_info();
    }
    setup_logging(&logging)?;
    log_welcome(&logging.app_name, softphone_presenter::VERSION);

    let config = args.load_config()?;
    let client = Arc::new(LoopbackCallClient::from_config(&config.loopback));
    let tokens = LoopbackTokenService::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let mut form = CredentialsForm::from_defaults(&config.credentials, config.token.clone());
        let Some(params) = credentials_screen(&mut form, &tokens, &mut lines).await? else {
            break;
        };

        let mut presenter = CallPresenter::new(client.clone(), params);
        match call_screen(&mut presenter, &client, &mut lines).await? {
            Exit::Back => leave(presenter).await?,
            Exit::Quit => break,
        }
    }

    info!("Bye");
    Ok(())
}
