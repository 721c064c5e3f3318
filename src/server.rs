//! HTTP surface: the webhook routes and error-to-status mapping.
//!
//! Three routes:
//!
//! - `GET /` — plain-text liveness probe
//! - `POST /webhook` — image pipeline, body `{image_url, name}`
//! - `POST /webhook/pdf` — lab-report pipeline, body `{pdf_url, name}`,
//!   with an optional `?persist=false` query parameter to skip the
//!   spreadsheet append
//!
//! Each [`IntakeError`] kind maps to a status code; only a genuinely
//! degraded-but-answered request (an LLM reply that isn't JSON) keeps the
//! 200 contract.

use crate::config::ServiceConfig;
use crate::error::IntakeError;
use crate::process::{self, Deps, IntakeRequest};
use crate::prompts::Purpose;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state: injected pipeline collaborators plus config.
#[derive(Clone)]
pub struct AppState {
    pub deps: Deps,
    pub config: Arc<ServiceConfig>,
}

/// Build the axum router.
pub fn build_app(deps: Deps, config: Arc<ServiceConfig>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/webhook", post(image_webhook))
        .route("/webhook/pdf", post(pdf_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { deps, config })
}

async fn liveness() -> &'static str {
    "docintake is running"
}

#[derive(Debug, Deserialize)]
struct ImageWebhookBody {
    image_url: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PdfWebhookBody {
    pdf_url: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersistParams {
    persist: Option<bool>,
}

async fn image_webhook(
    State(state): State<AppState>,
    Json(body): Json<ImageWebhookBody>,
) -> Response {
    let Some(image_url) = body.image_url else {
        return missing_field("Missing image_url");
    };
    let request = IntakeRequest {
        source_url: image_url,
        subject_name: body.name.unwrap_or_default(),
    };
    run_pipeline(&state, request, Purpose::MedicalExtraction, true).await
}

async fn pdf_webhook(
    State(state): State<AppState>,
    Query(params): Query<PersistParams>,
    Json(body): Json<PdfWebhookBody>,
) -> Response {
    let Some(pdf_url) = body.pdf_url else {
        return missing_field("Missing pdf_url");
    };
    let request = IntakeRequest {
        source_url: pdf_url,
        subject_name: body.name.unwrap_or_default(),
    };
    let persist = params.persist.unwrap_or(state.config.persist_by_default);
    run_pipeline(&state, request, Purpose::LabReportSummary, persist).await
}

async fn run_pipeline(
    state: &AppState,
    request: IntakeRequest,
    purpose: Purpose,
    persist: bool,
) -> Response {
    match process::process(&request, purpose, persist, &state.deps, &state.config).await {
        Ok(output) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "text": output.result,
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            (
                error_status(&e),
                Json(json!({
                    "status": "error",
                    "message": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

fn missing_field(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "status": "error", "message": message })),
    )
        .into_response()
}

/// Map an error kind to the HTTP status the caller sees.
///
/// Caller mistakes are 4xx, upstream-service trouble is 502/504, and
/// anything that points at this process is 500.
fn error_status(error: &IntakeError) -> StatusCode {
    match error {
        IntakeError::InvalidLinkFormat { .. } => StatusCode::BAD_REQUEST,
        IntakeError::DecodeFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeError::DownloadFailed { .. }
        | IntakeError::StructuringFailed { .. }
        | IntakeError::AppendFailed { .. }
        | IntakeError::SpreadsheetNotFound { .. }
        | IntakeError::AuthFailed { .. }
        | IntakeError::ProviderNotConfigured { .. } => StatusCode::BAD_GATEWAY,
        IntakeError::DownloadTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        IntakeError::ExtractionFailed { .. }
        | IntakeError::InvalidConfig(_)
        | IntakeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_mistakes_map_to_4xx() {
        let e = IntakeError::InvalidLinkFormat {
            url: "x".into(),
        };
        assert_eq!(error_status(&e), StatusCode::BAD_REQUEST);

        let e = IntakeError::DecodeFailed {
            kind: "image",
            detail: "bad".into(),
        };
        assert_eq!(error_status(&e), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn upstream_trouble_maps_to_gateway_statuses() {
        let e = IntakeError::DownloadFailed {
            file_id: "f".into(),
            reason: "HTTP 404".into(),
        };
        assert_eq!(error_status(&e), StatusCode::BAD_GATEWAY);

        let e = IntakeError::DownloadTimeout {
            file_id: "f".into(),
            secs: 120,
        };
        assert_eq!(error_status(&e), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn internal_faults_map_to_500() {
        let e = IntakeError::Internal("boom".into());
        assert_eq!(error_status(&e), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
