//! # HTTP Surface Tests
//!
//! Drive the axum router in-process with `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use tup900_edge::dispatch::control::RecordingControlPlane;
use tup900_edge::dispatch::{Dispatcher, Identity};
use tup900_edge::printer::{ConfigHandle, DEFAULT_PRINTER_PATH};
use tup900_edge::server;
use tup900_edge::transport::MemoryOpener;
use tup900_edge::worker::DeviceWorker;

fn app(printer: &MemoryOpener) -> (Router, Arc<Dispatcher>) {
    let dispatcher = Arc::new(Dispatcher::new(
        Identity::new("edge-01", "printer"),
        ConfigHandle::default(),
        DeviceWorker::spawn(printer.clone(), Duration::from_millis(100)),
        Arc::new(RecordingControlPlane::new()),
    ));
    (server::router(dispatcher.clone()), dispatcher)
}

async fn send(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let code = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (code, value)
}

#[tokio::test]
async fn test_print_method() {
    let printer = MemoryOpener::healthy();
    let (app, _) = app(&printer);

    let (code, body) = send(app, Method::POST, "/methods/print", r#"{"name":"Ada"}"#).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "Message deserialized and printed.");
    assert_eq!(body["deviceId"], "edge-01");
    assert!(!printer.written(DEFAULT_PRINTER_PATH).is_empty());
}

#[tokio::test]
async fn test_print_method_malformed_is_500() {
    let printer = MemoryOpener::healthy();
    let (app, _) = app(&printer);

    let (code, body) = send(app, Method::POST, "/methods/print", "{").await;

    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["status"]
            .as_str()
            .unwrap()
            .starts_with("Failed to print message")
    );
}

#[tokio::test]
async fn test_status_method() {
    let printer = MemoryOpener::healthy();
    let (app, _) = app(&printer);

    let (code, body) = send(app, Method::POST, "/methods/status", "").await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["paperCollected"], true);
    assert_eq!(body["rollMissing"], false);
}

#[tokio::test]
async fn test_unknown_method_is_501() {
    let printer = MemoryOpener::healthy();
    let (app, _) = app(&printer);

    let (code, body) = send(app, Method::POST, "/methods/selfTest", "{}").await;

    assert_eq!(code, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body, json!({"status": "Method 'selfTest' is not implemented"}));
    assert!(printer.opens().is_empty());
}

#[tokio::test]
async fn test_desired_then_reported() {
    let printer = MemoryOpener::healthy();
    let (app, dispatcher) = app(&printer);

    let (code, body) = send(
        app.clone(),
        Method::PATCH,
        "/twin/desired",
        r#"{"printerPath":"/dev/usb/lp0","$version":2}"#,
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"printerPath": "/dev/usb/lp0"}));

    let (code, body) = send(app, Method::GET, "/twin/reported", "").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"printerPath": "/dev/usb/lp0"}));
    assert_eq!(dispatcher.reported().printer_path, "/dev/usb/lp0");
}

#[tokio::test]
async fn test_desired_rejections_are_400() {
    let printer = MemoryOpener::healthy();
    let (app, dispatcher) = app(&printer);

    let (code, _) = send(app.clone(), Method::PATCH, "/twin/desired", "not json").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, body) = send(app, Method::PATCH, "/twin/desired", r#"{"printerPath":1}"#).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["status"].as_str().unwrap().contains("printerPath"));
    assert_eq!(dispatcher.reported().printer_path, DEFAULT_PRINTER_PATH);
}

#[tokio::test]
async fn test_health() {
    let printer = MemoryOpener::healthy();
    let (app, _) = app(&printer);

    let (code, body) = send(app, Method::GET, "/health", "").await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["deviceId"], "edge-01");
    assert_eq!(body["moduleId"], "printer");
    assert_eq!(body["printerPath"], DEFAULT_PRINTER_PATH);
}
