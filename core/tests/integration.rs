//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port (a plain thread
//! driving a current-thread tokio runtime), then exercises the client over
//! real HTTP: construction-time appid validation, all three query forms,
//! and the collapse of transport failures into absent results.

use std::collections::HashSet;
use std::sync::mpsc;
use std::time::Duration;

use wolfram_core::{ApiError, WolframClient};

const APPID: &str = "TEST-APPID";

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, APPID).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// A base URL nothing is listening on.
fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[test]
fn construction_accepts_valid_appid() {
    let base = start_server();
    let client = WolframClient::with_endpoint(APPID, &base).unwrap();
    assert_eq!(client.appid(), APPID);
}

#[test]
fn construction_rejects_wrong_appid() {
    let base = start_server();
    let err = WolframClient::with_endpoint("WRONG-KEY", &base).unwrap_err();
    match err {
        ApiError::InvalidAppid(appid) => assert_eq!(appid, "WRONG-KEY"),
        other => panic!("expected InvalidAppid, got {other}"),
    }
}

#[test]
fn construction_survives_unreachable_endpoint() {
    // Validation cannot reach the service; the key is taken on faith.
    let client = WolframClient::with_endpoint(APPID, &dead_endpoint()).unwrap();
    assert_eq!(client.appid(), APPID);
}

#[test]
fn blocking_query_round_trip() {
    let base = start_server();
    let client = WolframClient::with_endpoint(APPID, &base).unwrap();

    let result = client.query("sqrt16").expect("query should produce a result");
    assert!(result.success);
    assert!(!result.error);
    assert_eq!(result.version.as_deref(), Some("2.6"));
    assert_eq!(result.pods.len(), 2);

    let input = &result.pods[0];
    assert_eq!(input.id.as_deref(), Some("Input"));
    assert_eq!(input.subpods[0].plaintext.as_deref(), Some("sqrt16"));

    let answer = &result.pods[1];
    assert_eq!(answer.id.as_deref(), Some("Result"));
    assert_eq!(answer.scanner_id.as_deref(), Some("Simplification"));
    assert!(answer.subpods[0].image_url.is_some());
}

#[test]
fn query_transport_failure_is_none() {
    let client = WolframClient::with_endpoint(APPID, &dead_endpoint()).unwrap();
    assert!(client.query("sqrt16").is_none());
}

#[test]
fn queued_query_invokes_callback_exactly_once() {
    let base = start_server();
    let client = WolframClient::with_endpoint(APPID, &base).unwrap();

    let (tx, rx) = mpsc::channel();
    client.queue_query("pi", move |result| tx.send(result).unwrap());

    let result = rx
        .recv_timeout(Duration::from_secs(10))
        .unwrap()
        .expect("queued query should produce a result");
    assert_eq!(result.pods[0].subpods[0].plaintext.as_deref(), Some("pi"));

    // No further messages arrive once the callback has fired.
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn queued_query_reports_failure_as_none() {
    let client = WolframClient::with_endpoint(APPID, &dead_endpoint()).unwrap();

    let (tx, rx) = mpsc::channel();
    client.queue_query("pi", move |result| tx.send(result).unwrap());

    let result = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(result.is_none());
}

#[test]
fn submitted_query_resolves_through_handle() {
    let base = start_server();
    let client = WolframClient::with_endpoint(APPID, &base).unwrap();

    let task = client.submit_query("e");
    let result = task.wait().expect("submitted query should resolve");
    assert!(result.success);
    assert_eq!(result.pods[0].subpods[0].plaintext.as_deref(), Some("e"));
}

#[test]
fn submitted_query_failure_resolves_to_none() {
    let client = WolframClient::with_endpoint(APPID, &dead_endpoint()).unwrap();
    assert!(client.submit_query("e").wait().is_none());
}

#[test]
fn concurrent_queries_stay_independent() {
    let base = start_server();
    let client = WolframClient::with_endpoint(APPID, &base).unwrap();

    let (tx, rx) = mpsc::channel();
    let inputs: Vec<String> = (0..8).map(|i| format!("query{i}")).collect();
    for input in &inputs {
        let tx = tx.clone();
        let owned = input.clone();
        client.queue_query(input, move |result| tx.send((owned, result)).unwrap());
    }
    drop(tx);

    let mut seen = HashSet::new();
    for _ in 0..inputs.len() {
        let (input, result) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let result = result.expect("each query should produce a result");
        assert_eq!(
            result.pods[0].subpods[0].plaintext.as_deref(),
            Some(input.as_str())
        );
        assert!(seen.insert(input), "callback fired twice for one query");
    }
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}
