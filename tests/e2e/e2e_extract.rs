use std::time::Duration;

use axum::Router;
use axum::extract::Json;
use axum::http::StatusCode;
use axum::routing::post;
use extract_smoke::{
    Client, ExtractClient, HttpErrorKind, HttpRequest, SAMPLE_TEXT, write_report,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::time::sleep;

#[derive(Debug, Deserialize, Serialize)]
struct EchoPayload {
    text: String,
}

#[tokio::test]
async fn e2e_success_roundtrip_renders_full_report() {
    let server = TestServer::start().await;
    let client = ExtractClient::new(server.url("/gemini/extract"));

    let response = client
        .extract(SAMPLE_TEXT)
        .await
        .expect("local test server should answer");
    assert_eq!(response.status(), 200);

    let mut out = Vec::new();
    write_report(&mut out, &response).expect("report to a buffer");
    assert_eq!(
        String::from_utf8(out).expect("report is UTF-8"),
        "Status: 200\nRaw Text: {\"ok\":true}\nParsed JSON: {\"ok\":true}\n"
    );
}

#[tokio::test]
async fn e2e_utf8_text_survives_the_roundtrip() {
    let server = TestServer::start().await;
    let client = ExtractClient::new(server.url("/echo"));

    let response = client
        .extract(SAMPLE_TEXT)
        .await
        .expect("echo endpoint should answer");
    let echoed: EchoPayload = response.json().expect("echo body should parse");
    assert_eq!(echoed.text, SAMPLE_TEXT);
}

#[tokio::test]
async fn e2e_non_json_body_is_reported_not_fatal() {
    let server = TestServer::start().await;
    let client = ExtractClient::new(server.url("/plain"));

    let response = client
        .extract(SAMPLE_TEXT)
        .await
        .expect("plain endpoint should answer");
    assert_eq!(response.status(), 200);

    let mut out = Vec::new();
    write_report(&mut out, &response).expect("report to a buffer");
    let report = String::from_utf8(out).expect("report is UTF-8");
    assert!(report.starts_with("Status: 200\nRaw Text: plain text\n"));
    assert!(report.contains("⚠️ JSON decode failed: "));
}

#[tokio::test]
async fn e2e_unreachable_server_fails_loud() {
    // Bind then drop to get a port with nothing listening on it.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = ExtractClient::new(format!("http://{addr}/gemini/extract"));
    let err = client
        .extract(SAMPLE_TEXT)
        .await
        .expect_err("nothing is listening, the run must fail");
    assert_eq!(err.kind(), HttpErrorKind::Connect);
}

#[tokio::test]
async fn e2e_explicit_timeout_surfaces_timeout_kind() {
    let server = TestServer::start().await;
    let client = Client::new();

    let err = client
        .execute(
            HttpRequest::post(server.url("/slow"))
                .with_header("content-type", "application/json")
                .with_body(r#"{"text":"x"}"#)
                .with_timeout(Duration::from_millis(200)),
        )
        .await
        .expect_err("explicit timeout should trigger before the slow reply");
    assert_eq!(err.kind(), HttpErrorKind::Timeout);
}

struct TestServer {
    base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let app = Router::new()
            .route("/gemini/extract", post(ok_handler))
            .route("/echo", post(echo_handler))
            .route("/plain", post(plain_handler))
            .route("/slow", post(slow_handler));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url, task }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn ok_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, r#"{"ok":true}"#)
}

async fn echo_handler(Json(payload): Json<EchoPayload>) -> Json<EchoPayload> {
    Json(payload)
}

async fn plain_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "plain text")
}

async fn slow_handler() -> (StatusCode, &'static str) {
    sleep(Duration::from_millis(2500)).await;
    (StatusCode::OK, r#"{"ok":true}"#)
}
