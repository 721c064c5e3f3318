//! Google API clients: service-account auth, Drive downloads, Sheets
//! appends.
//!
//! Each client is a thin reqwest wrapper behind a trait seam
//! ([`drive::FileStore`], [`sheets::RowSink`]) so the pipeline never talks
//! to Google directly and tests can substitute fakes.

pub mod auth;
pub mod drive;
pub mod sheets;
