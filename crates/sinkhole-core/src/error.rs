// ── Core error types ──
//
// User-facing errors from sinkhole-core. Consumers never see reqwest
// errors or raw JSON failures; the `From<sinkhole_api::Error>` impl
// translates transport-layer errors into these variants.

use thiserror::Error;

use crate::command::CommandKind;
use crate::model::DomainList;

/// Unified error type for the core crate.
///
/// Every variant carries owned strings only, so the error is `Clone` and
/// can be handed to every caller that collapsed onto one login attempt.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    /// Bad password, or re-authentication exhausted. The UI should route
    /// to credential entry.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// An operation needing a session was attempted while logged out.
    #[error("Not signed in to the appliance")]
    NotSignedIn,

    // ── Transport errors ─────────────────────────────────────────────
    /// No response from the appliance (unreachable, refused, timed out).
    #[error("Cannot reach the appliance: {reason}")]
    NetworkFailure { reason: String },

    /// 5xx from the appliance, with its message.
    #[error("Appliance error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Any other 4xx the appliance refused.
    #[error("Request rejected by appliance: {message}")]
    Rejected { status: Option<u16>, message: String },

    /// The appliance answered with something we could not decode.
    #[error("Malformed response: {message}")]
    Malformed { message: String },

    // ── Command errors ───────────────────────────────────────────────
    /// Local input check failed; nothing was sent.
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    /// The entry is already on the list. Expected and non-fatal.
    #[error("'{domain}' is already on the {list} list")]
    DomainConflict { domain: String, list: DomainList },

    /// Another command of the same kind has not finished yet.
    #[error("A {kind} command is already in progress")]
    CommandInFlight { kind: CommandKind },

    // ── Companion errors ─────────────────────────────────────────────
    /// The companion transport is disconnected.
    #[error("Companion device unreachable")]
    CompanionUnreachable,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Credential store error: {message}")]
    CredentialStore { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if this error means the user has to re-enter
    /// credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// Returns `true` for errors the next poll or user action may clear.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. } | Self::ServerError { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sinkhole_api::Error> for CoreError {
    fn from(err: sinkhole_api::Error) -> Self {
        match err {
            sinkhole_api::Error::Unauthorized { message } => {
                CoreError::AuthenticationFailed { message }
            }
            sinkhole_api::Error::Client { status, message } => CoreError::Rejected {
                status: Some(status),
                message,
            },
            sinkhole_api::Error::Server { status, message } => {
                CoreError::ServerError { status, message }
            }
            sinkhole_api::Error::Transport(e) => CoreError::NetworkFailure {
                reason: e.to_string(),
            },
            sinkhole_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sinkhole_api::Error::Tls(msg) => CoreError::NetworkFailure {
                reason: format!("TLS error: {msg}"),
            },
            sinkhole_api::Error::Deserialization { message, body: _ } => {
                CoreError::Malformed { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_onto_taxonomy() {
        let auth: CoreError = sinkhole_api::Error::Unauthorized {
            message: "expired".into(),
        }
        .into();
        assert!(auth.is_auth_failure());

        let server: CoreError = sinkhole_api::Error::Server {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(server.is_transient());
        assert!(matches!(server, CoreError::ServerError { status: 502, .. }));

        let malformed: CoreError = sinkhole_api::Error::Deserialization {
            message: "eof".into(),
            body: String::new(),
        }
        .into();
        assert!(matches!(malformed, CoreError::Malformed { .. }));
    }
}
