//! Result sink: append rows to a Google Sheet.
//!
//! The Sheets v4 API addresses spreadsheets by ID, but operators usually
//! configure this service with the document title they see in Drive. A
//! configured name is resolved to an ID once through a Drive `files.list`
//! query and cached for the process lifetime, mirroring the access-token
//! cache in [`crate::google::auth`].
//!
//! Appends are append-only by contract: no read-back verification, no
//! updates, no deletes. A failed append surfaces as
//! [`IntakeError::AppendFailed`] and the HTTP layer turns it into an error
//! status.

use crate::config::SpreadsheetRef;
use crate::error::IntakeError;
use crate::google::auth::ServiceAccountAuth;
use crate::output::Row;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Seam between the pipeline and the spreadsheet service.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Append one row to its worksheet.
    async fn append(&self, row: &Row) -> Result<(), IntakeError>;
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
}

/// Sheets v4 `values:append` client.
pub struct SheetsAppender {
    auth: Arc<ServiceAccountAuth>,
    client: reqwest::Client,
    spreadsheet: SpreadsheetRef,
    resolved_id: RwLock<Option<String>>,
}

impl SheetsAppender {
    pub fn new(auth: Arc<ServiceAccountAuth>, spreadsheet: SpreadsheetRef) -> Self {
        Self {
            auth,
            client: reqwest::Client::new(),
            spreadsheet,
            resolved_id: RwLock::new(None),
        }
    }

    /// The spreadsheet ID, resolving a configured name on first use.
    async fn spreadsheet_id(&self, token: &str) -> Result<String, IntakeError> {
        if let SpreadsheetRef::Id(id) = &self.spreadsheet {
            return Ok(id.clone());
        }

        {
            let cached = self.resolved_id.read().await;
            if let Some(id) = cached.as_ref() {
                return Ok(id.clone());
            }
        }

        let SpreadsheetRef::Name(name) = &self.spreadsheet else {
            unreachable!("Id handled above");
        };

        // Drive query-language string literal: escape embedded quotes.
        let escaped = name.replace('\'', "\\'");
        let query = format!(
            "name = '{escaped}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
        let response = self
            .client
            .get("https://www.googleapis.com/drive/v3/files")
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id)"),
                ("pageSize", "1"),
            ])
            .send()
            .await
            .map_err(|e| IntakeError::AppendFailed {
                reason: format!("spreadsheet lookup failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(IntakeError::AppendFailed {
                reason: format!("spreadsheet lookup failed: HTTP {}", response.status()),
            });
        }

        let list: FileList = response.json().await.map_err(|e| IntakeError::AppendFailed {
            reason: format!("malformed lookup response: {e}"),
        })?;

        let id = list
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| IntakeError::SpreadsheetNotFound { name: name.clone() })?;

        info!("Resolved spreadsheet '{}' to id {}", name, id);
        let mut cached = self.resolved_id.write().await;
        *cached = Some(id.clone());
        Ok(id)
    }
}

#[async_trait]
impl RowSink for SheetsAppender {
    async fn append(&self, row: &Row) -> Result<(), IntakeError> {
        let token = self.auth.access_token().await?;
        let spreadsheet_id = self.spreadsheet_id(&token).await?;

        // The range is just the worksheet title; Sheets finds the table's
        // trailing edge itself.
        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}:append",
            spreadsheet_id,
            urlencode(&row.worksheet)
        );

        let body = json!({ "values": [row.cells] });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .map_err(|e| IntakeError::AppendFailed {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(IntakeError::AppendFailed {
                reason: format!("HTTP {status}: {detail}"),
            });
        }

        debug!(
            "Appended {}-cell row to worksheet '{}'",
            row.cells.len(),
            row.worksheet
        );
        Ok(())
    }
}

/// Percent-encode a worksheet title for use as a URL path segment.
fn urlencode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worksheet_titles_are_path_safe() {
        assert_eq!(urlencode("Image Data"), "Image%20Data");
        assert_eq!(urlencode("Lab_Reports-2025"), "Lab_Reports-2025");
        assert_eq!(urlencode("Résumé"), "R%C3%A9sum%C3%A9");
    }
}
