//! The intake pipeline: one document reference in, one structured result
//! out.
//!
//! Control flow is strictly linear per request — link, fetch, extract,
//! structure, persist — and any step's failure short-circuits. The only
//! state shared between requests lives inside the injected clients (HTTP
//! connection pools, the token cache, the resolved spreadsheet id).

use crate::config::ServiceConfig;
use crate::error::IntakeError;
use crate::google::drive::FileStore;
use crate::google::sheets::RowSink;
use crate::link;
use crate::output::{PipelineOutput, PipelineStats, Row};
use crate::pipeline::extract::ContentExtractor;
use crate::pipeline::llm::Structurer;
use crate::pipeline::postprocess;
use crate::prompts::Purpose;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One webhook invocation's input. Transient: constructed per HTTP call,
/// discarded after the response.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeRequest {
    /// The shared Drive URL.
    pub source_url: String,
    /// The subject (patient) name landing in the first spreadsheet column.
    pub subject_name: String,
}

/// Explicitly constructed, injected collaborators — no process-wide
/// singletons. Every field is a trait object so tests can substitute fakes.
#[derive(Clone)]
pub struct Deps {
    pub files: Arc<dyn FileStore>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub structurer: Arc<dyn Structurer>,
    pub sink: Arc<dyn RowSink>,
}

/// Run the full pipeline for one request.
///
/// # Arguments
/// * `purpose` — selects the extraction variant (image OCR vs. PDF text),
///   the prompt template, and the spreadsheet row shape
/// * `persist` — when false, the append step is skipped entirely and the
///   result is only returned to the caller
///
/// # Errors
/// Any stage failure is returned as its [`IntakeError`] kind. An LLM reply
/// that is not valid JSON is *not* an error; it degrades inside the
/// returned [`PipelineOutput`].
pub async fn process(
    request: &IntakeRequest,
    purpose: Purpose,
    persist: bool,
    deps: &Deps,
    config: &ServiceConfig,
) -> Result<PipelineOutput, IntakeError> {
    let total_start = Instant::now();
    info!(
        "Processing {:?} request for '{}'",
        purpose, request.subject_name
    );

    // ── Step 1: Resolve the link ─────────────────────────────────────────
    let file_id = link::resolve_file_id(&request.source_url)?;
    debug!("Resolved file id: {}", file_id);

    // ── Step 2: Fetch the bytes ──────────────────────────────────────────
    let fetch_start = Instant::now();
    let bytes = deps.files.fetch(&file_id).await?;
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;
    debug!("Fetched {} bytes in {}ms", bytes.len(), fetch_duration_ms);

    // ── Step 3: Extract text ─────────────────────────────────────────────
    let extract_start = Instant::now();
    let text = match purpose {
        Purpose::MedicalExtraction => deps.extractor.extract_image(bytes).await?,
        Purpose::LabReportSummary => deps.extractor.extract_pdf(bytes).await?,
    };
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    debug!(
        "Extracted {} chars in {}ms",
        text.len(),
        extract_duration_ms
    );

    // ── Step 4: Structure via the LLM ────────────────────────────────────
    let llm_start = Instant::now();
    let completion = deps.structurer.structure(purpose, &text).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 5: Clean up and parse the reply ─────────────────────────────
    let result = postprocess::parse_structured(&completion.content);
    if !result.is_parsed() {
        info!("LLM reply did not parse as JSON; returning degraded result");
    }

    // ── Step 6: Append the row (optional) ────────────────────────────────
    if persist {
        let worksheet = match purpose {
            Purpose::MedicalExtraction => &config.image_worksheet,
            Purpose::LabReportSummary => &config.lab_worksheet,
        };
        let row = Row::for_purpose(purpose, worksheet, &request.subject_name, &result);
        deps.sink.append(&row).await?;
    } else {
        debug!("Persistence disabled for this request; skipping append");
    }

    let stats = PipelineStats {
        fetch_duration_ms,
        extract_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        retries: completion.retries,
        persisted: persist,
    };

    info!(
        "Pipeline complete for '{}' in {}ms (persisted: {})",
        request.subject_name, stats.total_duration_ms, persist
    );

    Ok(PipelineOutput { result, stats })
}
