use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use voxminute::cli::{
    handle_chat_command, handle_delete_command, handle_login_command, handle_logout_command,
    handle_play_command, handle_record_command, handle_signup_command, handle_status_command,
    handle_summarize_command, handle_transcribe_command, handle_upload_command, Cli, CliCommand,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Signup(args)) => handle_signup_command(args).await,
        Some(CliCommand::Login(args)) => handle_login_command(args).await,
        Some(CliCommand::Logout) => handle_logout_command(),
        Some(CliCommand::Record(args)) => handle_record_command(args).await,
        Some(CliCommand::Upload(args)) => handle_upload_command(args).await,
        Some(CliCommand::Status(args)) => handle_status_command(args).await,
        Some(CliCommand::Transcribe(args)) => handle_transcribe_command(args).await,
        Some(CliCommand::Summarize(args)) => handle_summarize_command(args).await,
        Some(CliCommand::Chat(args)) => handle_chat_command(args).await,
        Some(CliCommand::Play(args)) => handle_play_command(args).await,
        Some(CliCommand::Delete(args)) => handle_delete_command(args).await,
        Some(CliCommand::Version) | None => {
            println!("VoxMinute {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
