#![allow(missing_docs)]

use std::net::TcpListener;
use std::time::{Duration, Instant};

use aau_heartbeat::{HeartbeatDispatcher, HeartbeatError, probe, resolve_endpoint};
use aau_settings::{ConfigSnapshot, HeartbeatMode};
use assert_matches::assert_matches;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UA: &str = "aau/0.1.0 c/AAAAAAAAAAAAAAAAAAAAAA s/BBBBBBBBBBBBBBBBBBBBBB";

#[tokio::test(flavor = "multi_thread")]
async fn heartbeat_sends_head_with_suffix_as_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/main/noarch/activate-0.0.0-0.conda"))
        .and(header("user-agent", UA))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = ConfigSnapshot {
        heartbeat: HeartbeatMode::Url(format!("{}/main", server.uri())),
        ..ConfigSnapshot::default()
    };
    let url = resolve_endpoint(&snapshot, None, None).unwrap();

    let handle = HeartbeatDispatcher::new(Duration::from_secs(5)).fire(&url, UA);
    let finished = tokio::task::spawn_blocking(move || handle.join_within(Duration::from_secs(5)))
        .await
        .unwrap();
    assert!(finished);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = probe(&format!("{}/ping", server.uri()), UA, Duration::from_secs(5)).await;
    assert_matches!(result, Err(HeartbeatError::Status { status: 503 }));
}

#[tokio::test]
async fn success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let status = probe(&format!("{}/ping", server.uri()), UA, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(status, 200);
}

#[tokio::test]
async fn unresponsive_endpoint_times_out() {
    // Accepted by the kernel backlog but never answered.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hang", listener.local_addr().unwrap());

    let start = Instant::now();
    let result = probe(&url, UA, Duration::from_millis(300)).await;
    assert_matches!(result, Err(HeartbeatError::Timeout { .. }));
    assert!(start.elapsed() < Duration::from_secs(2));
    drop(listener);
}

#[test]
fn fire_returns_immediately_and_finishes_within_deadline() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hang", listener.local_addr().unwrap());

    let start = Instant::now();
    let handle = HeartbeatDispatcher::new(Duration::from_secs(1)).fire(&url, UA);
    assert!(start.elapsed() < Duration::from_millis(500));

    assert!(handle.join_within(Duration::from_secs(3)));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(900), "finished too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2500), "took {elapsed:?}");
    drop(listener);
}

#[test]
fn refused_connection_is_swallowed() {
    // Bind then drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let handle = HeartbeatDispatcher::new(Duration::from_secs(1))
        .fire(&format!("http://127.0.0.1:{port}/x"), UA);
    assert!(handle.join_within(Duration::from_secs(3)));
}
