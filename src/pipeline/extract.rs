//! Content extraction: raw document bytes → plain text.
//!
//! Two variants, selected by the caller — there is no auto-detection,
//! because the webhook route already told us what the file is supposed to
//! be:
//!
//! - **Image**: decode with the `image` crate (validation only), then OCR
//!   by shelling out to the tesseract executable on a temp file. Running
//!   the engine as an external command keeps the build free of libtesseract
//!   linkage and lets deployments swap the binary.
//! - **PDF**: verify the `%PDF` magic, write the bytes to a managed temp
//!   file (pdfium cannot stream from a buffer), then extract each page's
//!   embedded text in document order and concatenate with no separator.
//!
//! Both variants are CPU-bound and run under `spawn_blocking` so they do
//! not stall the Tokio workers handling other webhook requests.

use crate::error::IntakeError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::io::Write;
use std::process::Command;
use tracing::{debug, info};

/// Seam between the pipeline and the extraction toolchain.
///
/// Production uses [`LocalExtractor`]; tests substitute a fake so the suite
/// runs without tesseract or a pdfium library installed.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// OCR a raster image into free text.
    async fn extract_image(&self, bytes: Vec<u8>) -> Result<String, IntakeError>;

    /// Extract the embedded text of every PDF page, concatenated in
    /// document order.
    async fn extract_pdf(&self, bytes: Vec<u8>) -> Result<String, IntakeError>;
}

/// Extractor backed by the local tesseract executable and pdfium library.
pub struct LocalExtractor {
    ocr_command: String,
    ocr_language: String,
}

impl LocalExtractor {
    pub fn new(ocr_command: impl Into<String>, ocr_language: impl Into<String>) -> Self {
        Self {
            ocr_command: ocr_command.into(),
            ocr_language: ocr_language.into(),
        }
    }
}

#[async_trait]
impl ContentExtractor for LocalExtractor {
    async fn extract_image(&self, bytes: Vec<u8>) -> Result<String, IntakeError> {
        let cmd = self.ocr_command.clone();
        let lang = self.ocr_language.clone();
        tokio::task::spawn_blocking(move || ocr_image_blocking(&bytes, &cmd, &lang))
            .await
            .map_err(|e| IntakeError::Internal(format!("OCR task panicked: {e}")))?
    }

    async fn extract_pdf(&self, bytes: Vec<u8>) -> Result<String, IntakeError> {
        tokio::task::spawn_blocking(move || pdf_text_blocking(&bytes))
            .await
            .map_err(|e| IntakeError::Internal(format!("PDF task panicked: {e}")))?
    }
}

/// Decode-check the image and run the OCR command on a temp file.
fn ocr_image_blocking(bytes: &[u8], command: &str, language: &str) -> Result<String, IntakeError> {
    // Decode first so invalid uploads fail as DecodeFailed, not as an
    // opaque engine error.
    image::load_from_memory(bytes).map_err(|e| IntakeError::DecodeFailed {
        kind: "image",
        detail: e.to_string(),
    })?;

    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| IntakeError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| IntakeError::Internal(format!("tempfile write: {e}")))?;

    let output = Command::new(command)
        .arg(tmp.path())
        .arg("stdout")
        .arg("-l")
        .arg(language)
        .arg("--psm")
        .arg("6")
        .output()
        .map_err(|e| IntakeError::ExtractionFailed {
            detail: format!("failed to run '{command}': {e}"),
        })?;

    if !output.status.success() {
        return Err(IntakeError::ExtractionFailed {
            detail: format!(
                "'{command}' exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!("OCR produced {} chars", text.len());
    Ok(text)
}

/// Open the PDF with pdfium and concatenate per-page text.
fn pdf_text_blocking(bytes: &[u8]) -> Result<String, IntakeError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(IntakeError::DecodeFailed {
            kind: "PDF",
            detail: "missing %PDF header".into(),
        });
    }

    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| IntakeError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| IntakeError::Internal(format!("tempfile write: {e}")))?;

    let pdfium = Pdfium::default();
    let document =
        pdfium
            .load_pdf_from_file(tmp.path(), None)
            .map_err(|e| IntakeError::DecodeFailed {
                kind: "PDF",
                detail: format!("{e:?}"),
            })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut text = String::new();
    for page in pages.iter() {
        let page_text = page.text().map_err(|e| IntakeError::ExtractionFailed {
            detail: format!("{e:?}"),
        })?;
        text.push_str(&page_text.all());
    }

    debug!("PDF text extraction produced {} chars", text.len());
    Ok(text)
}
