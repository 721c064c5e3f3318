//! Error types for the docintake service.
//!
//! Every pipeline stage returns `Result<_, IntakeError>` and the HTTP layer
//! maps each kind to a status code (see [`crate::server`]). One failure mode
//! is deliberately *not* an error: an LLM response that survives cleanup but
//! is not valid JSON degrades to
//! [`crate::output::StructuredResult::Unparsed`] and is reported to the
//! caller as data, because the upstream text is still worth returning.

use thiserror::Error;

/// All errors returned by the docintake pipeline and its clients.
#[derive(Debug, Error)]
pub enum IntakeError {
    // ── Link resolution ───────────────────────────────────────────────────
    /// The shared URL matched none of the known Drive link shapes.
    #[error("Invalid Google Drive link format: '{url}'\nExpected a '/d/<id>/' or 'id=<id>' style sharing link.")]
    InvalidLinkFormat { url: String },

    // ── Download ──────────────────────────────────────────────────────────
    /// The Drive media download failed (HTTP error, network failure).
    #[error("Drive download failed for file '{file_id}': {reason}")]
    DownloadFailed { file_id: String, reason: String },

    /// The download exceeded the configured timeout.
    #[error("Drive download timed out after {secs}s for file '{file_id}'\nIncrease download_timeout_secs if the file is large.")]
    DownloadTimeout { file_id: String, secs: u64 },

    // ── Content extraction ────────────────────────────────────────────────
    /// The downloaded bytes are not a valid document of the expected kind.
    #[error("Downloaded bytes are not a valid {kind}: {detail}")]
    DecodeFailed { kind: &'static str, detail: String },

    /// The document decoded but text extraction failed.
    #[error("Text extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    // ── Structuring (LLM) ─────────────────────────────────────────────────
    /// No LLM provider could be constructed (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion call failed after all retries.
    #[error("Structuring call failed after {retries} retries: {detail}")]
    StructuringFailed { retries: u32, detail: String },

    // ── Result sink ───────────────────────────────────────────────────────
    /// The spreadsheet append was rejected or unreachable.
    #[error("Spreadsheet append failed: {reason}")]
    AppendFailed { reason: String },

    /// No spreadsheet with the configured name was visible to the
    /// service account.
    #[error("Spreadsheet '{name}' not found.\nShare the sheet with the service-account email and check the name.")]
    SpreadsheetNotFound { name: String },

    // ── Auth ──────────────────────────────────────────────────────────────
    /// Service-account credentials were missing or the token exchange failed.
    #[error("Google authentication failed: {detail}")]
    AuthFailed { detail: String },

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
