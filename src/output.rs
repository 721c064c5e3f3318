//! Output types: the structured result, spreadsheet rows, and run stats.

use crate::prompts::Purpose;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Error message reported when the cleaned LLM response is not valid JSON.
pub const PARSE_ERROR_MESSAGE: &str = "Failed to parse cleaned AI response";

/// The structuring agent's output.
///
/// `Unparsed` is a degraded-but-successful outcome, not an error: the model
/// answered, the answer just wasn't valid JSON after fence stripping. It is
/// serialised as `{"error": ..., "raw": ...}` so the caller still receives
/// the raw text and can recover it by hand.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredResult {
    /// The cleaned response parsed as JSON.
    Parsed(Value),
    /// The cleaned response was not valid JSON; `raw` holds the cleaned text.
    Unparsed { raw: String },
}

impl StructuredResult {
    /// The JSON value reported to callers.
    pub fn to_value(&self) -> Value {
        match self {
            StructuredResult::Parsed(v) => v.clone(),
            StructuredResult::Unparsed { raw } => json!({
                "error": PARSE_ERROR_MESSAGE,
                "raw": raw,
            }),
        }
    }

    /// Whether the response parsed cleanly.
    pub fn is_parsed(&self) -> bool {
        matches!(self, StructuredResult::Parsed(_))
    }
}

impl Serialize for StructuredResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// One spreadsheet row, addressed to a worksheet.
///
/// Cell layout depends on the purpose:
/// - image pipeline → `(name, serialized JSON)`
/// - lab pipeline   → `(name, english summary, arabic summary)`
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Destination worksheet title within the spreadsheet.
    pub worksheet: String,
    /// Ordered cell values, leftmost column first.
    pub cells: Vec<String>,
}

impl Row {
    /// Build the row for a pipeline purpose.
    ///
    /// Lab rows pull `summary.english` / `summary.arabic` out of the result;
    /// a missing or unparsed summary degrades to empty cells rather than
    /// dropping the row, so the subject name still lands in the sheet.
    pub fn for_purpose(
        purpose: Purpose,
        worksheet: &str,
        name: &str,
        result: &StructuredResult,
    ) -> Self {
        let cells = match purpose {
            Purpose::MedicalExtraction => {
                vec![name.to_string(), result.to_value().to_string()]
            }
            Purpose::LabReportSummary => {
                let value = result.to_value();
                let field = |pointer: &str| {
                    value
                        .pointer(pointer)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                vec![
                    name.to_string(),
                    field("/summary/english"),
                    field("/summary/arabic"),
                ]
            }
        };
        Self {
            worksheet: worksheet.to_string(),
            cells,
        }
    }
}

/// Per-stage timing and token counts for one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Drive download wall-clock time.
    pub fetch_duration_ms: u64,
    /// OCR / PDF text extraction wall-clock time.
    pub extract_duration_ms: u64,
    /// LLM call wall-clock time, including retries.
    pub llm_duration_ms: u64,
    /// End-to-end pipeline time.
    pub total_duration_ms: u64,
    /// Prompt tokens reported by the provider.
    pub input_tokens: usize,
    /// Completion tokens reported by the provider.
    pub output_tokens: usize,
    /// LLM retries consumed before success.
    pub retries: u32,
    /// Whether a spreadsheet row was appended.
    pub persisted: bool,
}

/// Result of one pipeline run: the structured value plus run stats.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// The structured (or degraded) result.
    pub result: StructuredResult,
    /// Timing and token accounting.
    pub stats: PipelineStats,
}
