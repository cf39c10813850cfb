//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use sinkhole_config::ConfigError;
use sinkhole_core::{CoreError, DomainList};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the appliance")]
    #[diagnostic(
        code(sinkhole::connection_failed),
        help(
            "{reason}\n\
             Check the URL with: sinkhole config show\n\
             Self-signed certificate? Try: --insecure"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Appliance error (HTTP {status}): {message}")]
    #[diagnostic(code(sinkhole::server_error))]
    ServerError { status: u16, message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(sinkhole::auth_failed),
        help("Sign in again with: sinkhole login")
    )]
    AuthFailed { message: String },

    #[error("Not signed in")]
    #[diagnostic(
        code(sinkhole::not_signed_in),
        help(
            "No stored password for this appliance.\n\
             Run: sinkhole login\n\
             Or set SINKHOLE_PASSWORD."
        )
    )]
    NotSignedIn,

    // ── Domains ──────────────────────────────────────────────────────
    #[error("'{domain}' is already on the {list} list")]
    #[diagnostic(code(sinkhole::conflict))]
    Conflict { domain: String, list: DomainList },

    #[error("Not found: {message}")]
    #[diagnostic(code(sinkhole::not_found))]
    NotFound { message: String },

    // ── Requests ─────────────────────────────────────────────────────
    #[error("Request rejected: {message}")]
    #[diagnostic(code(sinkhole::rejected))]
    Rejected { message: String },

    #[error("Unexpected response from the appliance: {message}")]
    #[diagnostic(code(sinkhole::malformed))]
    Malformed { message: String },

    #[error("{message}")]
    #[diagnostic(code(sinkhole::busy))]
    Busy { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sinkhole::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No appliance configured")]
    #[diagnostic(
        code(sinkhole::no_server),
        help(
            "Pass --server, or save one with: sinkhole config set-server <URL>\n\
             Config file: {path}"
        )
    )]
    NoServer { path: String },

    #[error("{message}")]
    #[diagnostic(code(sinkhole::config))]
    Config { message: String },

    #[error("Credential store error: {message}")]
    #[diagnostic(
        code(sinkhole::keyring),
        help("Set SINKHOLE_PASSWORD to bypass the system keyring.")
    )]
    Keyring { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotSignedIn => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NoServer { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::NotSignedIn => CliError::NotSignedIn,
            CoreError::NetworkFailure { reason } => CliError::ConnectionFailed { reason },
            CoreError::CompanionUnreachable => CliError::ConnectionFailed {
                reason: "companion device unreachable".into(),
            },
            CoreError::ServerError { status, message } => CliError::ServerError { status, message },
            CoreError::Rejected {
                status: Some(404),
                message,
            } => CliError::NotFound { message },
            CoreError::Rejected { message, .. } => CliError::Rejected { message },
            CoreError::Malformed { message } => CliError::Malformed { message },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::DomainConflict { domain, list } => CliError::Conflict { domain, list },
            err @ CoreError::CommandInFlight { .. } => CliError::Busy {
                message: err.to_string(),
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::CredentialStore { message } => CliError::Keyring { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoServer => CliError::NoServer {
                path: sinkhole_config::config_path().display().to_string(),
            },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
