use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use super::args::AuthCliArgs;
use crate::api::ApiClient;
use crate::config::Config;
use crate::session::Session;

fn resolve_credentials(args: AuthCliArgs) -> Result<(String, String)> {
    let username = match args.username {
        Some(username) => username,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };
    Ok((username, password))
}

pub async fn handle_signup_command(args: AuthCliArgs) -> Result<()> {
    let config = Config::load()?;
    let (username, password) = resolve_credentials(args)?;

    let client = ApiClient::new(&config.backend.base_url, Session::default());
    match client.register(&username, &password).await {
        Ok(()) => {
            println!("Account created. Log in with: voxminute login -u {username}");
            Ok(())
        }
        Err(e) => {
            eprintln!("Signup failed: {}", e.user_message());
            Err(e.into())
        }
    }
}

pub async fn handle_login_command(args: AuthCliArgs) -> Result<()> {
    let config = Config::load()?;
    let (username, password) = resolve_credentials(args)?;

    let client = ApiClient::new(&config.backend.base_url, Session::default());
    match client.login(&username, &password).await {
        Ok(token) => {
            let session = Session {
                token: Some(token),
                username: Some(username.clone()),
            };
            session.save()?;
            println!("Logged in as {username}.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Login failed: {}", e.user_message());
            Err(e.into())
        }
    }
}

pub fn handle_logout_command() -> Result<()> {
    Session::clear()?;
    println!("Logged out.");
    Ok(())
}
