#![allow(clippy::unwrap_used)]
// Command routing tests: pause with optimistic caching, domain lists,
// local validation and the per-kind in-flight guard.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sinkhole_api::TransportConfig;
use sinkhole_core::{
    Command, CommandKind, CommandResult, CommandRouter, CoreError, Credentials, DomainList,
    SessionManager, StatusPoller, StatusSource, StatusStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    session: SessionManager,
    store: Arc<StatusStore>,
    router: CommandRouter,
    poller: StatusPoller,
}

async fn signed_in() -> Harness {
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

    let store = Arc::new(StatusStore::new());
    let session = SessionManager::new(TransportConfig::default(), Arc::clone(&store));
    let creds = Credentials::new(Url::parse(&server.uri()).unwrap(), "hunter2");
    session.activate(creds).await.unwrap();

    let router = CommandRouter::new(session.clone(), Arc::clone(&store));
    let poller = StatusPoller::new(session.clone(), Arc::clone(&store), Duration::from_secs(5));
    Harness {
        server,
        session,
        store,
        router,
        poller,
    }
}

async fn mount_blocking(server: &MockServer, blocking: bool) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/dns/blocking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blocking": blocking })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blocking": false })))
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

// ── Pause ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pause_scenario_optimistic_then_confirmed() {
    let h = signed_in().await;
    mount_blocking(&h.server, true).await;

    let status = h.poller.poll_once().await.unwrap();
    assert!(status.active);
    assert_eq!(h.store.current().unwrap().source, StatusSource::Confirmed);

    let paused = h.router.pause_blocking(10).await.unwrap();
    assert!(!paused.active);
    let cached = h.store.current().unwrap();
    assert!(!cached.active);
    assert_eq!(cached.source, StatusSource::Optimistic);

    // The appliance agrees: still paused.
    mount_blocking(&h.server, false).await;
    h.poller.poll_once().await.unwrap();
    let cached = h.store.current().unwrap();
    assert!(!cached.active);
    assert_eq!(cached.source, StatusSource::Confirmed);

    // Timer elapsed: filtering is back on.
    mount_blocking(&h.server, true).await;
    h.poller.poll_once().await.unwrap();
    assert!(h.store.current().unwrap().active);
}

#[tokio::test]
async fn test_pause_sends_timer() {
    let h = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .and(header("X-FTL-SID", "S1"))
        .and(body_json(json!({ "blocking": false, "timer": 30 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blocking": false })))
        .expect(1)
        .mount(&h.server)
        .await;

    let result = h
        .router
        .execute(Command::PauseBlocking { seconds: 30 })
        .await
        .unwrap();
    assert!(matches!(result, CommandResult::Blocking(status) if !status.active));
}

#[tokio::test]
async fn test_rejected_pause_leaves_cache_alone() {
    let h = signed_in().await;
    mount_blocking(&h.server, true).await;
    h.poller.poll_once().await.unwrap();

    h.server.reset().await;
    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "key": "bad_request", "message": "Invalid timer", "hint": null }
        })))
        .mount(&h.server)
        .await;

    let err = h.router.pause_blocking(10).await.unwrap_err();
    assert!(matches!(err, CoreError::Rejected { status: Some(400), .. }), "got {err:?}");
    let cached = h.store.current().unwrap();
    assert!(cached.active);
    assert_eq!(cached.source, StatusSource::Confirmed);
}

#[tokio::test]
async fn test_pause_zero_seconds_is_rejected_locally() {
    let h = signed_in().await;
    let before = h.server.received_requests().await.unwrap().len();

    let err = h.router.pause_blocking(0).await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert_eq!(h.server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_overlapping_pause_is_rejected() {
    let h = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "blocking": false }))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&h.server)
        .await;

    let (first, second) = tokio::join!(h.router.pause_blocking(30), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.router.pause_blocking(60).await
    });

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(CoreError::CommandInFlight {
            kind: CommandKind::PauseBlocking
        })
    ));
    assert_eq!(requests_to(&h.server, "/api/dns/blocking").await, 1);

    // The slot is free again once the first command settles.
    h.router.pause_blocking(30).await.unwrap();
    assert_eq!(requests_to(&h.server, "/api/dns/blocking").await, 2);
}

#[tokio::test]
async fn test_different_kinds_may_overlap() {
    let h = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "blocking": false }))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/domains/deny"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .mount(&h.server)
        .await;

    let (pause, add) = tokio::join!(
        h.router.pause_blocking(30),
        h.router.add_domain("ads.example.com", DomainList::Deny),
    );
    assert!(pause.is_ok());
    assert!(add.is_ok());
}

#[tokio::test]
async fn test_pause_when_signed_out() {
    let h = signed_in().await;
    h.server.reset().await;
    Mock::given(method("DELETE"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;
    h.session.deactivate().await;

    let err = h.router.pause_blocking(10).await.unwrap_err();
    assert!(matches!(err, CoreError::NotSignedIn));
    assert_eq!(requests_to(&h.server, "/api/dns/blocking").await, 0);
}

// ── Domains ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_domain() {
    let h = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/api/domains/deny"))
        .and(body_json(json!({ "domain": "ads.example.com" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "processed": { "success": [{ "item": "ads.example.com" }], "errors": [] }
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    h.router
        .add_domain("ads.example.com", DomainList::Deny)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_duplicate_add_is_domain_conflict() {
    let h = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/api/domains/allow"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "key": "database_error",
                "message": "UNIQUE constraint failed: domainlist.domain, domainlist.type",
                "hint": null
            }
        })))
        .mount(&h.server)
        .await;

    let err = h
        .router
        .execute(Command::add_domain("example.com", DomainList::Allow))
        .await
        .unwrap_err();
    match err {
        CoreError::DomainConflict { domain, list } => {
            assert_eq!(domain, "example.com");
            assert_eq!(list, DomainList::Allow);
        }
        other => panic!("expected DomainConflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remove_domain() {
    let h = signed_in().await;
    Mock::given(method("DELETE"))
        .and(path("/api/domains/allow"))
        .and(body_json(json!({ "domain": "example.com" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    let result = h
        .router
        .execute(Command::remove_domain("example.com", DomainList::Allow))
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Ok);
}

#[tokio::test]
async fn test_invalid_domains_never_reach_the_network() {
    let h = signed_in().await;
    let before = h.server.received_requests().await.unwrap().len();

    for input in ["", "a b", "tab\there"] {
        let err = h.router.add_domain(input, DomainList::Deny).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }), "{input:?}");
        let err = h
            .router
            .remove_domain(input, DomainList::Allow)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }), "{input:?}");
    }

    assert_eq!(h.server.received_requests().await.unwrap().len(), before);
}
