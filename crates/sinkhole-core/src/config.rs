// ── Runtime connection configuration ──
//
// These types describe *how* to reach the appliance. They carry credential
// data and connection tuning, but never touch disk. The binary (or an
// embedding UI) constructs a `RemoteConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use sinkhole_api::{TlsMode, TransportConfig};
use url::Url;

/// Default interval between blocking-state polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default interval between status pushes to the companion device.
pub const DEFAULT_COMPANION_PUSH_INTERVAL: Duration = Duration::from_secs(10);

/// What the secure store hands back: where the appliance lives and its
/// password.
///
/// The core keeps this in memory only while a session may need to be
/// re-established; it never serializes it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub server_url: Url,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(server_url: Url, password: impl Into<String>) -> Self {
        Self {
            server_url,
            password: SecretString::from(password.into()),
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed appliance certs).
    DangerAcceptInvalid,
}

/// Configuration for one remote.
///
/// The intervals are fixed defaults today; they stay fields so a settings
/// screen can expose them later without touching the engine.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request network timeout.
    pub timeout: Duration,
    /// Blocking-state poll interval while signed in.
    pub poll_interval: Duration,
    /// Companion push interval while signed in. Zero disables pushes.
    pub companion_push_interval: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            poll_interval: DEFAULT_POLL_INTERVAL,
            companion_push_interval: DEFAULT_COMPANION_PUSH_INTERVAL,
        }
    }
}

impl RemoteConfig {
    /// The same connection settings with background polling and pushes
    /// turned off, for short-lived foreground use.
    #[must_use]
    pub fn foreground_only(&self) -> Self {
        Self {
            poll_interval: Duration::ZERO,
            companion_push_interval: Duration::ZERO,
            ..self.clone()
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
