//! Pipeline stages for document intake.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. a different OCR engine) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! link ──▶ fetch ──▶ extract ──▶ llm ──▶ postprocess ──▶ sink
//! (url)    (Drive)   (OCR/PDF)   (chat)  (fence+parse)   (Sheets)
//! ```
//!
//! 1. [`crate::link`]          — shared URL → Drive file id
//! 2. [`crate::google::drive`] — file id → raw bytes, fully drained
//! 3. [`extract`]              — bytes → plain text; runs in
//!    `spawn_blocking` because OCR and pdfium are CPU-bound
//! 4. [`llm`]                  — text → model reply with retry/backoff; the
//!    only stage with LLM network I/O
//! 5. [`postprocess`]          — fence stripping and JSON parsing into a
//!    [`crate::output::StructuredResult`]
//! 6. [`crate::google::sheets`] — result → appended spreadsheet row

pub mod extract;
pub mod llm;
pub mod postprocess;
