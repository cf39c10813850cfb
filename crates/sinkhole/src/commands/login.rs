//! `sinkhole login`

use std::io::IsTerminal;

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use sinkhole_config::{ConfigError, PASSWORD_ENV};
use sinkhole_core::{Credentials, Remote};

use super::Context;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct LoginView {
    server: String,
    hostname: Option<String>,
}

/// Ask for the appliance URL when neither `--server` nor the config
/// names one.
pub fn prompt_server() -> Result<String, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(ConfigError::NoServer.into());
    }
    let server: String = Input::new()
        .with_prompt("Appliance URL")
        .interact_text()
        .map_err(|e| CliError::Validation {
            field: "interactive".into(),
            reason: format!("prompt failed: {e}"),
        })?;
    Ok(server)
}

fn read_password(ctx: &Context) -> Result<SecretString, CliError> {
    if let Some(password) = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty()) {
        return Ok(SecretString::from(password));
    }
    let password = rpassword::prompt_password(format!("Password for {}: ", ctx.server))?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

pub async fn handle(ctx: &Context) -> Result<(), CliError> {
    let password = read_password(ctx)?;
    let credentials = Credentials::new(ctx.server.clone(), password.expose_secret());

    let remote = Remote::new(ctx.remote.foreground_only(), ctx.credentials());
    let result = remote.sign_in(credentials).await;
    let host = remote.host();
    remote.shutdown().await;
    result?;

    let view = LoginView {
        server: ctx.server.to_string(),
        hostname: host.map(|h| h.hostname),
    };
    let rendered = output::render(ctx.format, &view, |v| match v.hostname {
        Some(ref host) => format!("Signed in to {host}"),
        None => format!("Signed in to {}", v.server),
    })?;
    ctx.print(&rendered);
    Ok(())
}
