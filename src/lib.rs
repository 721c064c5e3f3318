//! # docintake
//!
//! Webhook service that turns Drive-shared medical documents into
//! structured spreadsheet rows.
//!
//! A caller POSTs a Google Drive sharing link; docintake downloads the
//! file, extracts its text (tesseract OCR for photographs, pdfium embedded
//! text for lab-report PDFs), asks an LLM to structure the text into JSON,
//! and appends the result to a Google Sheet.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /webhook[/pdf]
//!  │
//!  ├─ 1. Link     extract the Drive file id from the shared URL
//!  ├─ 2. Fetch    download the file bytes (service-account auth)
//!  ├─ 3. Extract  OCR the image / pull per-page PDF text (spawn_blocking)
//!  ├─ 4. LLM      low-temperature chat completion with a fixed template
//!  ├─ 5. Clean    strip markdown fences, parse as JSON
//!  └─ 6. Sink     append a row to the configured worksheet
//! ```
//!
//! Each request runs the pipeline start to finish on its own task; the
//! only shared state is the long-lived clients (connection pools, the
//! OAuth token cache, the resolved spreadsheet id).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docintake::{build_app, Deps, LlmStructurer, LocalExtractor, ServiceConfig};
//! use docintake::google::auth::ServiceAccountAuth;
//! use docintake::google::drive::DriveFiles;
//! use docintake::google::sheets::SheetsAppender;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(ServiceConfig::default());
//!     let auth = Arc::new(ServiceAccountAuth::from_env()?);
//!     let deps = Deps {
//!         files: Arc::new(DriveFiles::new(auth.clone(), config.download_timeout_secs)?),
//!         extractor: Arc::new(LocalExtractor::new(&config.ocr_command, &config.ocr_language)),
//!         structurer: Arc::new(LlmStructurer::from_config(&config)?),
//!         sink: Arc::new(SheetsAppender::new(auth, config.spreadsheet.clone())),
//!     };
//!     let app = build_app(deps, config.clone());
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docintake` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod google;
pub mod link;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder, SpreadsheetRef};
pub use error::IntakeError;
pub use output::{PipelineOutput, PipelineStats, Row, StructuredResult};
pub use pipeline::extract::{ContentExtractor, LocalExtractor};
pub use pipeline::llm::{Completion, LlmStructurer, Structurer};
pub use process::{process, Deps, IntakeRequest};
pub use prompts::Purpose;
pub use server::build_app;
