//! Instruction templates for the structuring call.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing what the model is asked to
//!    return (e.g. adding a field to the lab summary) requires editing
//!    exactly one place.
//!
//! 2. **Testability** — unit tests can inspect assembled prompts without
//!    spinning up a real LLM, making template regressions easy to catch.
//!
//! Callers can override the system prompt via
//! [`crate::config::ServiceConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

use serde::{Deserialize, Serialize};

/// What the caller wants the model to do with the extracted text.
///
/// The purpose selects the prompt template and, downstream, the spreadsheet
/// row shape (see [`crate::output::Row`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purpose {
    /// Open-ended extraction of patient data from a photographed document.
    MedicalExtraction,
    /// Bilingual summary of a lab report PDF.
    LabReportSummary,
}

/// System prompt for [`Purpose::MedicalExtraction`].
pub const MEDICAL_EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a medical information extractor. You respond with JSON only, \
     never with commentary or markdown fences.";

/// System prompt for [`Purpose::LabReportSummary`].
pub const LAB_SUMMARY_SYSTEM_PROMPT: &str =
    "You are a clinical lab assistant who summarises lab reports for \
     patients. You respond with JSON only, never with commentary or \
     markdown fences.";

impl Purpose {
    /// The built-in system prompt for this purpose.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Purpose::MedicalExtraction => MEDICAL_EXTRACTION_SYSTEM_PROMPT,
            Purpose::LabReportSummary => LAB_SUMMARY_SYSTEM_PROMPT,
        }
    }

    /// Assemble the user message embedding the extracted document text.
    pub fn user_prompt(&self, text: &str) -> String {
        match self {
            Purpose::MedicalExtraction => format!(
                "Extract key patient data, vitals, diagnoses, test results, \
                 medications, and relevant structured info from this medical \
                 text. Return the result as JSON like: {{\"data\": ...}}.\n\n\
                 Medical Text:\n{text}"
            ),
            Purpose::LabReportSummary => format!(
                "Summarise this lab report for the patient, highlighting any \
                 abnormal results and what they mean. Return the result as \
                 JSON exactly shaped: {{\"summary\": {{\"english\": \"...\", \
                 \"arabic\": \"...\"}}}} with the same summary in both \
                 languages.\n\nLab Report Text:\n{text}"
            ),
        }
    }
}
