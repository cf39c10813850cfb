//! Shared configuration for the sinkhole CLI and app shells.
//!
//! A small TOML file (appliance URL, TLS and timeout settings) layered
//! with `SINKHOLE_*` environment variables, translation to
//! `sinkhole_core::RemoteConfig`, and a keyring-backed
//! [`CredentialStore`] for the appliance password.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use sinkhole_core::{CoreError, CredentialStore, Credentials, RemoteConfig, TlsVerification};

/// Keyring service name; the account is the appliance URL.
pub const KEYRING_SERVICE: &str = "sinkhole";

/// Overrides the stored password when set.
pub const PASSWORD_ENV: &str = "SINKHOLE_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no appliance configured (set `server` in the config or pass --server)")]
    NoServer,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::Config {
            message: err.to_string(),
        }
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Appliance base URL (e.g. "http://pi.hole").
    pub server: Option<String>,

    /// Output format: "plain" or "json".
    #[serde(default = "default_output")]
    pub output: String,

    /// Accept self-signed appliance certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: None,
            output: default_output(),
            insecure: false,
            ca_cert: None,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "plain".into()
}
fn default_timeout() -> u64 {
    10
}

impl Config {
    /// The configured appliance URL.
    pub fn server_url(&self) -> Result<Url, ConfigError> {
        let server = self.server.as_deref().ok_or(ConfigError::NoServer)?;
        parse_server(server)
    }

    /// Build a [`RemoteConfig`] from these settings. Poll and push
    /// intervals keep their defaults.
    pub fn to_remote_config(&self) -> RemoteConfig {
        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        RemoteConfig {
            tls,
            timeout: Duration::from_secs(self.timeout),
            ..RemoteConfig::default()
        }
    }
}

/// Parse an appliance URL, defaulting to `http://` when no scheme is given.
pub fn parse_server(server: &str) -> Result<Url, ConfigError> {
    let candidate = if server.contains("://") {
        server.to_owned()
    } else {
        format!("http://{server}")
    };
    let url = Url::parse(&candidate).map_err(|e| ConfigError::Validation {
        field: "server".into(),
        reason: format!("{server}: {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sinkhole", "sinkhole").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sinkhole");
    p
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load the Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SINKHOLE_").only(&[
            "server", "output", "insecure", "ca_cert", "timeout",
        ]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring credential store ────────────────────────────────────────

/// [`CredentialStore`] backed by the config file (appliance URL) and
/// the system keyring (password, keyed by URL).
pub struct KeyringCredentialStore {
    config_path: PathBuf,
    server_override: Option<Url>,
    password_override: Option<SecretString>,
}

impl KeyringCredentialStore {
    /// Store using the canonical config path, honouring
    /// [`PASSWORD_ENV`].
    pub fn new() -> Self {
        let store = Self::at(config_path());
        match std::env::var(PASSWORD_ENV) {
            Ok(password) if !password.is_empty() => {
                store.with_password_override(SecretString::from(password))
            }
            _ => store,
        }
    }

    /// Store whose appliance URL lives in the config file at `path`.
    pub fn at(path: PathBuf) -> Self {
        Self {
            config_path: path,
            server_override: None,
            password_override: None,
        }
    }

    /// Use `server` instead of the configured appliance URL.
    pub fn with_server(mut self, server: Url) -> Self {
        self.server_override = Some(server);
        self
    }

    /// Use `password` instead of reading the keyring.
    pub fn with_password_override(mut self, password: SecretString) -> Self {
        self.password_override = Some(password);
        self
    }

    fn server(&self) -> Result<Option<Url>, ConfigError> {
        if let Some(ref url) = self.server_override {
            return Ok(Some(url.clone()));
        }
        let cfg = load_config_from(&self.config_path)?;
        match cfg.server.as_deref() {
            Some(server) => parse_server(server).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn keyring_entry(server: &Url) -> Result<keyring::Entry, CoreError> {
    keyring::Entry::new(KEYRING_SERVICE, server.as_str()).map_err(store_error)
}

fn store_error(err: keyring::Error) -> CoreError {
    CoreError::CredentialStore {
        message: err.to_string(),
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save(&self, credentials: &Credentials) -> Result<(), CoreError> {
        let mut cfg = load_config_from(&self.config_path)?;
        cfg.server = Some(credentials.server_url.to_string());
        save_config_to(&cfg, &self.config_path)?;

        keyring_entry(&credentials.server_url)?
            .set_password(credentials.password.expose_secret())
            .map_err(store_error)?;
        debug!(server = %credentials.server_url, "credentials saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<Credentials>, CoreError> {
        let Some(server_url) = self.server()? else {
            debug!("no appliance configured");
            return Ok(None);
        };

        if let Some(ref password) = self.password_override {
            return Ok(Some(Credentials {
                server_url,
                password: password.clone(),
            }));
        }

        match keyring_entry(&server_url)?.get_password() {
            Ok(password) => Ok(Some(Credentials::new(server_url, password))),
            Err(keyring::Error::NoEntry) => {
                debug!(server = %server_url, "no stored password");
                Ok(None)
            }
            Err(e) => Err(store_error(e)),
        }
    }
}
