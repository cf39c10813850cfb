#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use sinkhole_config::{
    Config, ConfigError, KeyringCredentialStore, load_config_from, parse_server, save_config_to,
};
use sinkhole_core::{CredentialStore, TlsVerification};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.output, "plain");
    assert_eq!(cfg.timeout, 10);
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let cfg = Config {
        server: Some("https://pi.hole".into()),
        output: "json".into(),
        insecure: true,
        ca_cert: None,
        timeout: 3,
    };

    save_config_to(&cfg, &path).unwrap();
    assert_eq!(load_config_from(&path).unwrap(), cfg);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "server = \"pi.hole\"\n").unwrap();

    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg.server.as_deref(), Some("pi.hole"));
    assert_eq!(cfg.timeout, 10);
    assert_eq!(cfg.server_url().unwrap().as_str(), "http://pi.hole/");
}

#[test]
fn test_parse_server() {
    assert_eq!(
        parse_server("192.168.1.2:8080").unwrap().as_str(),
        "http://192.168.1.2:8080/"
    );
    assert_eq!(
        parse_server("https://pi.hole").unwrap().as_str(),
        "https://pi.hole/"
    );
    assert!(matches!(
        parse_server("ftp://pi.hole"),
        Err(ConfigError::Validation { .. })
    ));
    assert!(matches!(
        Config::default().server_url(),
        Err(ConfigError::NoServer)
    ));
}

#[test]
fn test_to_remote_config() {
    let cfg = Config {
        insecure: true,
        timeout: 4,
        ..Config::default()
    };
    let remote = cfg.to_remote_config();
    assert_eq!(remote.tls, TlsVerification::DangerAcceptInvalid);
    assert_eq!(remote.timeout, Duration::from_secs(4));

    let cfg = Config {
        ca_cert: Some("/etc/pihole/ca.pem".into()),
        ..Config::default()
    };
    assert_eq!(
        cfg.to_remote_config().tls,
        TlsVerification::CustomCa("/etc/pihole/ca.pem".into())
    );
    assert_eq!(
        Config::default().to_remote_config().tls,
        TlsVerification::SystemDefaults
    );
}

#[test]
fn test_credentials_absent_without_server() {
    let dir = tempfile::tempdir().unwrap();
    let store = KeyringCredentialStore::at(dir.path().join("config.toml"))
        .with_password_override(SecretString::from("hunter2"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn test_password_override_skips_keyring() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "server = \"http://pi.hole\"\n").unwrap();

    let store = KeyringCredentialStore::at(path)
        .with_password_override(SecretString::from("hunter2"));
    let creds = store.load().unwrap().unwrap();
    assert_eq!(creds.server_url.as_str(), "http://pi.hole/");
    assert_eq!(creds.password.expose_secret(), "hunter2");
}

#[test]
fn test_server_override_wins_over_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "server = \"http://pi.hole\"\n").unwrap();

    let store = KeyringCredentialStore::at(path)
        .with_server(Url::parse("https://10.0.0.2").unwrap())
        .with_password_override(SecretString::from("hunter2"));
    let creds = store.load().unwrap().unwrap();
    assert_eq!(creds.server_url.as_str(), "https://10.0.0.2/");
}
