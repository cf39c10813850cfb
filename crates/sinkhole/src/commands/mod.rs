//! Command dispatch: bridges CLI args -> core Remote -> output formatting.

pub mod blocking;
pub mod config_cmd;
pub mod domains;
pub mod login;

use std::sync::Arc;

use clap::ValueEnum;
use url::Url;

use sinkhole_config::{Config, KeyringCredentialStore};
use sinkhole_core::{CoreError, CredentialStore, DomainList, Remote, RemoteConfig};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Everything an appliance-bound command needs, resolved once from the
/// config file and the global flags.
pub struct Context {
    pub server: Url,
    pub remote: RemoteConfig,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Context {
    /// Flags win over the config file.
    pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<Self, CliError> {
        let mut cfg = cfg.clone();
        if global.insecure {
            cfg.insecure = true;
        }
        if let Some(timeout) = global.timeout {
            cfg.timeout = timeout;
        }
        if let Some(ref server) = global.server {
            cfg.server = Some(server.clone());
        }

        let format = match global.output {
            Some(format) => format,
            None => OutputFormat::from_str(&cfg.output, true).map_err(|_| {
                CliError::Validation {
                    field: "output".into(),
                    reason: format!("'{}' is not one of: plain, json", cfg.output),
                }
            })?,
        };

        Ok(Self {
            server: cfg.server_url()?,
            remote: cfg.to_remote_config(),
            format,
            color: output::should_color(global.color),
            quiet: global.quiet,
        })
    }

    /// Keyring-backed store pinned to the resolved appliance.
    pub fn credentials(&self) -> Arc<dyn CredentialStore> {
        Arc::new(KeyringCredentialStore::new().with_server(self.server.clone()))
    }

    /// Sign in with the stored password, run `f`, sign out.
    pub async fn oneshot<F, Fut, T>(&self, f: F) -> Result<T, CliError>
    where
        F: FnOnce(Remote) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        Ok(Remote::oneshot(self.remote.clone(), self.credentials(), f).await?)
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.quiet);
    }
}

/// Dispatch an appliance-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Status => blocking::status(ctx).await,
        Command::Pause(args) => blocking::pause(ctx, args).await,
        Command::Watch => blocking::watch(ctx).await,
        Command::Allow(args) => domains::handle(ctx, DomainList::Allow, args).await,
        Command::Deny(args) => domains::handle(ctx, DomainList::Deny, args).await,
        // Login, Config and Completions are handled before dispatch
        Command::Login | Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the appliance dispatcher".into(),
        )),
    }
}
