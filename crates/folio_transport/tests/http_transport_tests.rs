//! Integration tests for the HTTP transport.
//!
//! Each test starts a small fake content service on an ephemeral port and
//! points an `HttpTransport` at it.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use folio_core::{ClientConfig, Document, FailureKind, IngestSource};
use folio_transport::{ChatRequest, HttpTransport, TransportClient};

/// A multipart field as the fake service received it.
#[derive(Debug, Clone)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

type Received = Arc<Mutex<Vec<ReceivedField>>>;

async fn spawn_service(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn transport(base_url: &str) -> HttpTransport {
    HttpTransport::new(ClientConfig::new(base_url).timeout(5)).unwrap()
}

async fn record_upload(State(received): State<Received>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap().to_vec();
        received.lock().push(ReceivedField {
            name,
            file_name,
            content_type,
            data,
        });
    }
    Json(json!({
        "text_preview": "Alice was beginning to get very tired",
        "total_chars": 10,
        "characters": ["Alice", "Bob"]
    }))
}

fn upload_router() -> (Router, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/upload", post(record_upload))
        .with_state(received.clone());
    (router, received)
}

/// Test a PDF upload is sent as the `file` multipart field.
#[tokio::test]
async fn test_ingest_file_sends_file_field() {
    let (router, received) = upload_router();
    let base_url = spawn_service(router).await;

    let document = Document::new("book.pdf", b"0123456789".to_vec());
    let report = transport(&base_url)
        .ingest(IngestSource::File(document))
        .await
        .unwrap();

    assert_eq!(report.characters.names(), ["Alice", "Bob"]);
    assert_eq!(report.total_chars, 10);
    assert!(report.text_preview.starts_with("Alice was"));

    let fields = received.lock().clone();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "file");
    assert_eq!(fields[0].file_name.as_deref(), Some("book.pdf"));
    assert_eq!(fields[0].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(fields[0].data, b"0123456789");
}

/// Test a URL ingestion is sent as the `url` text field.
#[tokio::test]
async fn test_ingest_url_sends_url_field() {
    let (router, received) = upload_router();
    let base_url = spawn_service(router).await;

    transport(&base_url)
        .ingest(IngestSource::Url("https://example.com/book.html".to_string()))
        .await
        .unwrap();

    let fields = received.lock().clone();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "url");
    assert!(fields[0].file_name.is_none());
    assert_eq!(fields[0].data, b"https://example.com/book.html");
}

/// Test a body without `characters` decodes to an empty roster.
#[tokio::test]
async fn test_ingest_without_characters_is_empty_roster() {
    let router = Router::new().route(
        "/upload",
        post(|| async { Json(json!({"text_preview": "", "total_chars": 0})) }),
    );
    let base_url = spawn_service(router).await;

    let report = transport(&base_url)
        .ingest(IngestSource::File(Document::new("book.pdf", vec![1u8; 10])))
        .await
        .unwrap();

    assert!(report.characters.is_empty());
}

/// Test a server error becomes NonSuccessStatus with a body excerpt.
#[tokio::test]
async fn test_ingest_server_error() {
    let router = Router::new().route(
        "/upload",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "spaCy model not loaded") }),
    );
    let base_url = spawn_service(router).await;

    let failure = transport(&base_url)
        .ingest(IngestSource::File(Document::new("book.pdf", vec![1u8; 10])))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::NonSuccessStatus(500));
    assert!(failure.detail.contains("spaCy model not loaded"));
}

/// Test the chat request body and reply mapping.
#[tokio::test]
async fn test_chat_turn_round_trip() {
    let router = Router::new().route(
        "/chat",
        post(|Json(request): Json<ChatRequest>| async move {
            Json(json!({"reply": format!("{} heard: {}", request.character, request.message)}))
        }),
    );
    let base_url = spawn_service(router).await;

    let reply = transport(&base_url)
        .send_chat_turn("Alice", "hello")
        .await
        .unwrap();

    assert_eq!(reply.reply, "Alice heard: hello");
}

/// Test a 200 body without `reply` is malformed.
#[tokio::test]
async fn test_chat_without_reply_is_malformed() {
    let router = Router::new().route("/chat", post(|| async { Json(json!({"answer": "hi"})) }));
    let base_url = spawn_service(router).await;

    let failure = transport(&base_url)
        .send_chat_turn("Alice", "hello")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::MalformedResponse);
    assert!(failure.detail.contains("reply"));
}

/// Test a 200 body that is not JSON is malformed.
#[tokio::test]
async fn test_chat_with_non_json_body_is_malformed() {
    let router = Router::new().route("/chat", post(|| async { "<html>gateway</html>" }));
    let base_url = spawn_service(router).await;

    let failure = transport(&base_url)
        .send_chat_turn("Alice", "hello")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::MalformedResponse);
}

/// Test a missing route surfaces as NonSuccessStatus(404).
#[tokio::test]
async fn test_chat_missing_route() {
    let base_url = spawn_service(Router::new()).await;

    let failure = transport(&base_url)
        .send_chat_turn("Alice", "hello")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::NonSuccessStatus(404));
}

/// Test a slow service trips the configured timeout.
#[tokio::test]
async fn test_chat_timeout() {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"reply": "too late"}))
        }),
    );
    let base_url = spawn_service(router).await;

    let transport = HttpTransport::new(ClientConfig::new(&base_url).timeout(1)).unwrap();
    let failure = transport.send_chat_turn("Alice", "hello").await.unwrap_err();

    assert_eq!(failure.kind, FailureKind::Timeout);
    assert!(failure.detail.contains("1s"));
}

/// Test a closed port is reported as NetworkUnreachable.
#[tokio::test]
async fn test_unreachable_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let failure = transport(&format!("http://{}", addr))
        .send_chat_turn("Alice", "hello")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::NetworkUnreachable);
}

/// Test the health check returns the welcome message.
#[tokio::test]
async fn test_health_check() {
    let router = Router::new().route(
        "/",
        get(|| async { Json(json!({"message": "Welcome to Character Chat API"})) }),
    );
    let base_url = spawn_service(router).await;

    let message = transport(&base_url).health().await.unwrap();
    assert_eq!(message, "Welcome to Character Chat API");
}
