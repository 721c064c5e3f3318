//! End-to-end tests for the webhook routes.
//!
//! Every `Deps` seam gets a fake, so the suite exercises the full
//! request→pipeline→response path without tesseract, pdfium, Google, or an
//! LLM provider installed. Requests are driven straight through the router
//! with `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docintake::google::drive::FileStore;
use docintake::google::sheets::RowSink;
use docintake::{
    build_app, Completion, ContentExtractor, Deps, IntakeError, Purpose, Row, ServiceConfig,
    Structurer,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ── Fakes ────────────────────────────────────────────────────────────────────

enum FetchMode {
    Ok(Vec<u8>),
    NotFound,
}

struct FakeFiles {
    mode: FetchMode,
}

#[async_trait]
impl FileStore for FakeFiles {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, IntakeError> {
        match &self.mode {
            FetchMode::Ok(bytes) => Ok(bytes.clone()),
            FetchMode::NotFound => Err(IntakeError::DownloadFailed {
                file_id: file_id.to_string(),
                reason: "HTTP 404".into(),
            }),
        }
    }
}

/// Returns canned text and remembers which variant was asked for.
struct FakeExtractor {
    text: String,
    calls: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract_image(&self, _bytes: Vec<u8>) -> Result<String, IntakeError> {
        self.calls.lock().unwrap().push("image");
        Ok(self.text.clone())
    }

    async fn extract_pdf(&self, _bytes: Vec<u8>) -> Result<String, IntakeError> {
        self.calls.lock().unwrap().push("pdf");
        Ok(self.text.clone())
    }
}

struct FakeStructurer {
    reply: String,
}

#[async_trait]
impl Structurer for FakeStructurer {
    async fn structure(&self, _purpose: Purpose, _text: &str) -> Result<Completion, IntakeError> {
        Ok(Completion {
            content: self.reply.clone(),
            input_tokens: 10,
            output_tokens: 5,
            retries: 0,
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    rows: Mutex<Vec<Row>>,
}

#[async_trait]
impl RowSink for RecordingSink {
    async fn append(&self, row: &Row) -> Result<(), IntakeError> {
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn test_app(fetch: FetchMode, llm_reply: &str) -> (Router, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let deps = Deps {
        files: Arc::new(FakeFiles { mode: fetch }),
        extractor: Arc::new(FakeExtractor {
            text: "Patient: Jane. Weight 80kg. HbA1c 9.1% (high).".into(),
            calls: Mutex::new(Vec::new()),
        }),
        structurer: Arc::new(FakeStructurer {
            reply: llm_reply.to_string(),
        }),
        sink: sink.clone(),
    };
    let config = Arc::new(ServiceConfig::default());
    (build_app(deps, config), sink)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn liveness_route_responds() {
    let (app, _) = test_app(FetchMode::Ok(vec![1, 2, 3]), "{}");
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_image_url_is_400() {
    let (app, sink) = test_app(FetchMode::Ok(vec![]), "{}");
    let response = app
        .oneshot(post_json("/webhook", json!({"name": "Jane"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Missing image_url");
    assert!(sink.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_pdf_url_is_400() {
    let (app, _) = test_app(FetchMode::Ok(vec![]), "{}");
    let response = app
        .oneshot(post_json("/webhook/pdf", json!({"name": "John"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Missing pdf_url");
}

#[tokio::test]
async fn image_webhook_returns_structured_result_and_appends() {
    let reply = "```json\n{\"data\": {\"weight\": \"80kg\"}}\n```";
    let (app, sink) = test_app(FetchMode::Ok(b"fake-image".to_vec()), reply);
    let response = app
        .oneshot(post_json(
            "/webhook",
            json!({
                "image_url": "https://drive.google.com/file/d/ABC123/view",
                "name": "Jane"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["text"]["data"]["weight"], "80kg");

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].worksheet, "Image Data");
    assert_eq!(rows[0].cells[0], "Jane");
    let stored: Value = serde_json::from_str(&rows[0].cells[1]).unwrap();
    assert_eq!(stored["data"]["weight"], "80kg");
}

#[tokio::test]
async fn pdf_webhook_returns_bilingual_summary() {
    let reply = r#"{"summary": {"english": "HbA1c is high.", "arabic": "نسبة السكر مرتفعة."}}"#;
    let (app, sink) = test_app(FetchMode::Ok(b"%PDF-fake".to_vec()), reply);
    let response = app
        .oneshot(post_json(
            "/webhook/pdf",
            json!({
                "pdf_url": "https://drive.google.com/open?id=XYZ789",
                "name": "John"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
    assert!(!body["text"]["summary"]["english"]
        .as_str()
        .unwrap()
        .is_empty());
    assert!(!body["text"]["summary"]["arabic"]
        .as_str()
        .unwrap()
        .is_empty());

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].worksheet, "Lab Reports");
    assert_eq!(rows[0].cells, vec!["John", "HbA1c is high.", "نسبة السكر مرتفعة."]);
}

#[tokio::test]
async fn pdf_webhook_can_skip_persistence() {
    let reply = r#"{"summary": {"english": "ok", "arabic": "جيد"}}"#;
    let (app, sink) = test_app(FetchMode::Ok(b"%PDF-fake".to_vec()), reply);
    let response = app
        .oneshot(post_json(
            "/webhook/pdf?persist=false",
            json!({
                "pdf_url": "https://drive.google.com/open?id=XYZ789",
                "name": "John"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
    assert!(sink.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unrecognised_link_is_400_with_url_in_message() {
    let (app, _) = test_app(FetchMode::Ok(vec![]), "{}");
    let response = app
        .oneshot(post_json(
            "/webhook",
            json!({"image_url": "https://example.com/pic.png", "name": "Jane"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("https://example.com/pic.png"));
}

#[tokio::test]
async fn failed_download_is_502() {
    let (app, sink) = test_app(FetchMode::NotFound, "{}");
    let response = app
        .oneshot(post_json(
            "/webhook",
            json!({
                "image_url": "https://drive.google.com/file/d/GONE/view",
                "name": "Jane"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(sink.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unparsable_llm_reply_degrades_but_stays_200() {
    let reply = "The patient seems broadly fine.";
    let (app, sink) = test_app(FetchMode::Ok(b"fake-image".to_vec()), reply);
    let response = app
        .oneshot(post_json(
            "/webhook",
            json!({
                "image_url": "https://drive.google.com/file/d/ABC123/view",
                "name": "Jane"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["text"]["error"], "Failed to parse cleaned AI response");
    assert_eq!(body["text"]["raw"], "The patient seems broadly fine.");

    // The degraded result is still a row: nothing is silently lost.
    assert_eq!(sink.rows.lock().unwrap().len(), 1);
}
