mod common;

use common::{ApiClient, FetchError};
use httpstub::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn fetch_parses_the_json_body_on_a_2xx_response() {
    // Arrange
    let transport = FakeTransport::install();
    let client = ApiClient::new("http://localhost", transport.factory());

    let result = Arc::new(Mutex::new(None));
    let sink = result.clone();

    // Act: the client issues the request and suspends on the transport.
    client.fetch("/widget", move |outcome| {
        *sink.lock().unwrap() = Some(outcome);
    });

    transport.request(0).respond(
        TransportResponse::new(200)
            .header("content-type", "application/json")
            .json_body(json!({ "foo": "bar" })),
    );

    // Assert
    assert_eq!(transport.request(0).method(), Method::GET);
    assert_eq!(transport.request(0).url(), "http://localhost/widget");
    assert_eq!(
        result.lock().unwrap().take(),
        Some(Ok(json!({ "foo": "bar" })))
    );
}

#[test]
fn fetch_reports_a_non_2xx_status_as_an_error() {
    let transport = FakeTransport::install();
    let client = ApiClient::new("http://localhost", transport.factory());

    let result = Arc::new(Mutex::new(None));
    let sink = result.clone();
    client.fetch("/widget", move |outcome| {
        *sink.lock().unwrap() = Some(outcome);
    });

    // No body at all: the error path must not depend on one.
    transport.request(0).respond(TransportResponse::new(500));

    assert_eq!(
        result.lock().unwrap().take(),
        Some(Err(FetchError::Status(500)))
    );
}

#[test]
fn fetch_reports_a_failed_transport_as_an_error() {
    let transport = FakeTransport::install();
    let client = ApiClient::new("http://localhost", transport.factory());
    transport.restore();

    let result = Arc::new(Mutex::new(None));
    let sink = result.clone();
    client.fetch("/widget", move |outcome| {
        *sink.lock().unwrap() = Some(outcome);
    });

    assert!(matches!(
        result.lock().unwrap().take(),
        Some(Err(FetchError::Transport(_)))
    ));
}

#[test]
fn submit_serializes_the_payload_into_the_request_body() {
    let transport = FakeTransport::install();
    let client = ApiClient::new("http://localhost", transport.factory());

    let completed = Arc::new(AtomicUsize::new(0));
    let counter = completed.clone();
    client.submit("/greetings", &json!({ "hello": "world" }), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let request = transport.request(0);
    assert_eq!(request.method(), Method::POST);
    assert_eq!(request.body_str(), r#"{"hello":"world"}"#);
    assert_eq!(
        request.header_value("content-type").as_deref(),
        Some("application/json")
    );

    transport.request(0).respond(TransportResponse::new(201));
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}

#[test]
fn submit_completes_regardless_of_the_response_status() {
    let transport = FakeTransport::install();
    let client = ApiClient::new("http://localhost", transport.factory());

    let completed = Arc::new(AtomicUsize::new(0));
    let counter = completed.clone();
    client.submit("/greetings", &json!({ "hello": "world" }), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // The submit path interprets nothing, so a server error still completes.
    transport.request(0).respond(TransportResponse::new(500));

    assert_eq!(completed.load(Ordering::SeqCst), 1);
}
