use thiserror::Error;

/// Top-level error type for the `sinkhole-api` crate.
///
/// Every failed call lands in exactly one [`ErrorKind`]; `sinkhole-core`
/// maps these into user-facing diagnostics and decides retry policy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// HTTP 401: bad password on login, or a missing/expired session id.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // ── HTTP status ─────────────────────────────────────────────────
    /// Any other 4xx response.
    #[error("Request rejected (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    /// 5xx response.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// No response at all (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The body could not be decoded, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    ClientError,
    ServerError,
    NetworkFailure,
    Malformed,
}

impl Error {
    /// Classify the error for retry and routing decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Client { .. } | Self::InvalidUrl(_) => ErrorKind::ClientError,
            Self::Server { .. } => ErrorKind::ServerError,
            Self::Transport(_) | Self::Tls(_) => ErrorKind::NetworkFailure,
            Self::Deserialization { .. } => ErrorKind::Malformed,
        }
    }

    /// HTTP status code of the response, if there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the session id was rejected and a fresh login
    /// might resolve it.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a transient error worth retrying on the
    /// next natural attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NetworkFailure | ErrorKind::ServerError
        )
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
