use anyhow::{bail, Result};
use std::sync::Arc;

pub mod args;
pub mod auth;
pub mod detail;
pub mod play;
pub mod record;
pub mod status;
pub mod upload;

pub use args::{Cli, CliCommand};
pub use auth::{handle_login_command, handle_logout_command, handle_signup_command};
pub use detail::{
    handle_chat_command, handle_delete_command, handle_summarize_command,
    handle_transcribe_command,
};
pub use play::handle_play_command;
pub use record::handle_record_command;
pub use status::handle_status_command;
pub use upload::handle_upload_command;

use crate::api::ApiClient;
use crate::config::Config;
use crate::session::Session;

/// Load config and session, failing early when the user is not logged in.
pub(crate) fn authed_client() -> Result<(Config, Arc<ApiClient>)> {
    let config = Config::load()?;
    let session = Session::load()?;
    if !session.is_authenticated() {
        bail!("Not logged in. Run `voxminute login` first.");
    }
    let client = Arc::new(ApiClient::new(&config.backend.base_url, session));
    Ok((config, client))
}
