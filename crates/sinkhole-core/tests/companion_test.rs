#![allow(clippy::unwrap_used)]
// Companion bridge: command replies, status pushes and reachability.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sinkhole_api::TransportConfig;
use sinkhole_core::{
    CommandRouter, CompanionBridge, CompanionCommand, CompanionReply, CompanionRequest,
    CoreError, Credentials, SessionManager, StatusPoller, StatusStore, channel_transport,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    session: SessionManager,
    store: Arc<StatusStore>,
    poller: StatusPoller,
    bridge: CompanionBridge,
    transport: sinkhole_core::ChannelTransport,
    contexts: mpsc::UnboundedReceiver<serde_json::Value>,
}

async fn harness() -> Harness {
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
    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blocking": false })))
        .mount(&server)
        .await;

    let store = Arc::new(StatusStore::new());
    let session = SessionManager::new(TransportConfig::default(), Arc::clone(&store));
    let router = CommandRouter::new(session.clone(), Arc::clone(&store));
    let poller = StatusPoller::new(session.clone(), Arc::clone(&store), Duration::from_secs(5));
    let (transport, contexts) = channel_transport();
    let bridge = CompanionBridge::new(
        session.clone(),
        Arc::clone(&store),
        router,
        Arc::new(transport.clone()),
    );

    Harness {
        server,
        session,
        store,
        poller,
        bridge,
        transport,
        contexts,
    }
}

impl Harness {
    async fn sign_in(&self) {
        let creds = Credentials::new(Url::parse(&self.server.uri()).unwrap(), "hunter2");
        self.session.activate(creds).await.unwrap();
    }
}

// ── Inbound commands ────────────────────────────────────────────────

#[tokio::test]
async fn test_pause_while_logged_out_fails_without_calls() {
    let h = harness().await;

    let reply = h
        .bridge
        .handle(CompanionCommand::PauseBlocking { seconds: 30 })
        .await;

    assert_eq!(reply, CompanionReply::failed(false));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pause_while_signed_in() {
    let h = harness().await;
    h.sign_in().await;
    h.poller.poll_once().await.unwrap();

    let reply = h
        .bridge
        .handle(CompanionCommand::PauseBlocking { seconds: 30 })
        .await;

    assert_eq!(reply, CompanionReply::ok(false));
    assert!(!h.store.current().unwrap().active);
}

#[tokio::test]
async fn test_failed_pause_reports_last_known_state() {
    let h = harness().await;
    h.sign_in().await;
    h.poller.poll_once().await.unwrap();

    let reply = h
        .bridge
        .handle(CompanionCommand::PauseBlocking { seconds: 0 })
        .await;

    assert_eq!(reply, CompanionReply::failed(true));
}

#[tokio::test]
async fn test_serve_answers_each_request_once() {
    let h = harness().await;
    let (tx, rx) = mpsc::channel(4);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(h.bridge.clone().serve(rx, cancel.clone()));

    let (request, reply_rx) = CompanionRequest::new(CompanionCommand::PauseBlocking { seconds: 10 });
    tx.send(request).await.unwrap();
    assert_eq!(reply_rx.await.unwrap(), CompanionReply::failed(false));

    h.sign_in().await;
    let (request, reply_rx) = CompanionRequest::new(CompanionCommand::PauseBlocking { seconds: 10 });
    tx.send(request).await.unwrap();
    assert_eq!(reply_rx.await.unwrap(), CompanionReply::ok(false));

    cancel.cancel();
    task.await.unwrap();
}

// ── Outbound pushes ─────────────────────────────────────────────────

#[tokio::test]
async fn test_push_sends_cached_status() {
    let mut h = harness().await;
    h.sign_in().await;
    h.poller.poll_once().await.unwrap();

    assert!(h.bridge.push_status().unwrap());
    let context = h.contexts.recv().await.unwrap();
    assert_eq!(context["active"], json!(true));
    assert_eq!(context["source"], json!("confirmed"));
}

#[tokio::test]
async fn test_push_skips_when_nothing_to_send() {
    let h = harness().await;
    // Logged out.
    assert!(!h.bridge.push_status().unwrap());

    // Signed in, nothing polled yet.
    h.sign_in().await;
    assert!(!h.bridge.push_status().unwrap());
}

#[tokio::test]
async fn test_disconnect_stops_pushes_and_reconnect_resumes() {
    let mut h = harness().await;
    h.sign_in().await;
    h.poller.poll_once().await.unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(
        h.bridge
            .clone()
            .run_push(Duration::from_millis(20), cancel.clone()),
    );

    // Connected: pushes flow.
    tokio::time::timeout(Duration::from_secs(1), h.contexts.recv())
        .await
        .unwrap()
        .unwrap();

    // Disconnected: nothing arrives.
    h.transport.set_reachable(false);
    tokio::time::sleep(Duration::from_millis(30)).await;
    while h.contexts.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.contexts.try_recv().is_err());
    assert!(matches!(
        h.bridge.push_status(),
        Err(CoreError::CompanionUnreachable)
    ));

    // Reconnected: pushes resume.
    h.transport.set_reachable(true);
    tokio::time::timeout(Duration::from_secs(1), h.contexts.recv())
        .await
        .unwrap()
        .unwrap();

    cancel.cancel();
    task.await.unwrap();
}
