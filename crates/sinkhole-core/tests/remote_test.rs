#![allow(clippy::unwrap_used)]
// Remote facade: foreground lifecycle, credential persistence and the
// one-shot helper.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sinkhole_core::{
    CompanionCommand, CompanionReply, CompanionRequest, CoreError, CredentialStore, Credentials,
    MemoryCredentialStore, Remote, RemoteConfig, SessionState, channel_transport,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn appliance() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sid": "S1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/info/host"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hostname": "pi.hole" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dns/blocking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blocking": true })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    server
}

fn credentials(server: &MockServer) -> Credentials {
    Credentials::new(Url::parse(&server.uri()).unwrap(), "hunter2")
}

fn fast_config() -> RemoteConfig {
    RemoteConfig {
        poll_interval: Duration::from_millis(20),
        companion_push_interval: Duration::from_millis(20),
        ..RemoteConfig::default()
    }
}

async fn count(server: &MockServer, verb: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == route)
        .count()
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_resume_without_credentials() {
    let remote = Remote::new(fast_config(), Arc::new(MemoryCredentialStore::new()));
    let err = remote.resume().await.unwrap_err();
    assert!(matches!(err, CoreError::NotSignedIn));
    assert_eq!(*remote.session_state().borrow(), SessionState::LoggedOut);
}

#[tokio::test]
async fn test_sign_in_saves_credentials_only_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let remote = Remote::new(fast_config(), store.clone());
    let err = remote.sign_in(credentials(&server)).await.unwrap_err();

    assert!(err.is_auth_failure());
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_resume_polls_until_suspended() {
    let server = appliance().await;
    let store = Arc::new(MemoryCredentialStore::with(credentials(&server)));
    let remote = Remote::new(fast_config(), store);

    remote.resume().await.unwrap();
    let mut status = remote.status();
    tokio::time::timeout(Duration::from_secs(1), status.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(remote.current_status().unwrap().active);
    assert_eq!(remote.host().unwrap().hostname, "pi.hole");

    remote.suspend().await;
    assert_eq!(*remote.session_state().borrow(), SessionState::LoggedOut);
    assert_eq!(count(&server, "DELETE", "/api/auth").await, 1);

    // No polling after suspend.
    let polls = count(&server, "GET", "/api/dns/blocking").await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(count(&server, "GET", "/api/dns/blocking").await, polls);
}

#[tokio::test]
async fn test_resume_after_suspend_restarts_polling() {
    let server = appliance().await;
    let store = Arc::new(MemoryCredentialStore::with(credentials(&server)));
    let remote = Remote::new(fast_config(), store);

    remote.resume().await.unwrap();
    remote.suspend().await;
    let polls = count(&server, "GET", "/api/dns/blocking").await;

    remote.resume().await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(count(&server, "GET", "/api/dns/blocking").await > polls);
    remote.shutdown().await;
}

#[tokio::test]
async fn test_companion_requests_are_served() {
    let server = appliance().await;
    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blocking": false })))
        .mount(&server)
        .await;
    let (transport, mut contexts) = channel_transport();
    let store = Arc::new(MemoryCredentialStore::with(credentials(&server)));
    let remote = Remote::with_companion(fast_config(), store, Arc::new(transport));

    remote.resume().await.unwrap();
    tokio::time::timeout(Duration::from_secs(1), contexts.recv())
        .await
        .unwrap()
        .unwrap();

    let requests = remote.companion_requests().unwrap();
    let (request, reply) = CompanionRequest::new(CompanionCommand::PauseBlocking { seconds: 5 });
    requests.send(request).await.unwrap();
    assert_eq!(reply.await.unwrap(), CompanionReply::ok(false));

    remote.suspend().await;
    let (request, reply) = CompanionRequest::new(CompanionCommand::PauseBlocking { seconds: 5 });
    requests.send(request).await.unwrap();
    assert!(!reply.await.unwrap().success);

    remote.shutdown().await;
}

#[tokio::test]
async fn test_companion_request_fails_at_once_before_first_sign_in() {
    let (transport, _contexts) = channel_transport();
    let remote = Remote::with_companion(
        fast_config(),
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(transport),
    );
    assert!(matches!(
        remote.resume().await.unwrap_err(),
        CoreError::NotSignedIn
    ));

    let requests = remote.companion_requests().unwrap();
    let (request, reply) = CompanionRequest::new(CompanionCommand::PauseBlocking { seconds: 5 });
    requests.send(request).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(1), reply)
        .await
        .expect("companion should be answered without a session")
        .unwrap();
    assert_eq!(reply, CompanionReply::failed(false));

    remote.shutdown().await;
}

#[tokio::test]
async fn test_oneshot_signs_in_and_out() {
    let server = appliance().await;
    let store = Arc::new(MemoryCredentialStore::with(credentials(&server)));

    let status = Remote::oneshot(RemoteConfig::default(), store, |remote| async move {
        remote.refresh().await
    })
    .await
    .unwrap();

    assert!(status.active);
    assert_eq!(count(&server, "POST", "/api/auth").await, 1);
    assert_eq!(count(&server, "GET", "/api/dns/blocking").await, 1);
    assert_eq!(count(&server, "DELETE", "/api/auth").await, 1);
}
