//! Configuration for the docintake service.
//!
//! All pipeline behaviour is controlled through [`ServiceConfig`], built via
//! its [`ServiceConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share the config across request handlers, log it at startup,
//! and diff two deployments to understand why their outputs differ.

use crate::error::IntakeError;
use serde::{Deserialize, Serialize};

/// How the destination spreadsheet is addressed.
///
/// The Sheets v4 API works on spreadsheet IDs, but operators usually know
/// the document by its title. A `Name` is resolved to an ID once through a
/// Drive query and cached for the process lifetime (see
/// [`crate::google::sheets::SheetsAppender`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpreadsheetRef {
    /// Sheets API spreadsheet ID (the long token in the sheet URL).
    Id(String),
    /// Spreadsheet title, resolved via a Drive `files.list` query.
    Name(String),
}

/// Configuration for the extraction pipeline and its clients.
///
/// Built via [`ServiceConfig::builder()`] or [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use docintake::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .model("gpt-4o-mini")
///     .temperature(0.2)
///     .spreadsheet_id("1AbcDEF...")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// LLM model identifier, e.g. "gpt-4o-mini". If None, uses the
    /// provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai"). If None, the provider is
    /// auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Sampling temperature for the structuring completion. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to the extracted text —
    /// exactly what you want when the output must be machine-parseable JSON.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per request. Default: 4096.
    ///
    /// Dense lab reports can produce large structured payloads; setting this
    /// too low silently truncates the JSON mid-object, which then shows up
    /// as an `Unparsed` degraded result.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM API failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient. Permanent errors (bad API
    /// key, 400) also consume the retries, but the final error message names
    /// the underlying cause.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff).
    /// Default: 500. Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Drive download timeout in seconds. Default: 120.
    ///
    /// Without a timeout a stalled Drive download pins its request handler
    /// forever.
    pub download_timeout_secs: u64,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system prompt for the structuring call. If None, uses the
    /// per-purpose built-in from [`crate::prompts`].
    pub system_prompt: Option<String>,

    /// Destination spreadsheet. Default: named
    /// "Online Clients Weight Analysis NEW (Responses)".
    pub spreadsheet: SpreadsheetRef,

    /// Worksheet receiving image-pipeline rows. Default: "Image Data".
    pub image_worksheet: String,

    /// Worksheet receiving lab-report rows. Default: "Lab Reports".
    pub lab_worksheet: String,

    /// Whether `/webhook/pdf` persists by default when no `persist` query
    /// parameter is given. Default: true.
    pub persist_by_default: bool,

    /// OCR command to invoke for image extraction. Default: "tesseract".
    pub ocr_command: String,

    /// OCR language passed to the engine. Default: "eng".
    pub ocr_language: String,

    /// TCP port for the HTTP server. Default: 8080.
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            temperature: 0.2,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            system_prompt: None,
            spreadsheet: SpreadsheetRef::Name(
                "Online Clients Weight Analysis NEW (Responses)".to_string(),
            ),
            image_worksheet: "Image Data".to_string(),
            lab_worksheet: "Lab Reports".to_string(),
            persist_by_default: true,
            ocr_command: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            port: 8080,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn spreadsheet_id(mut self, id: impl Into<String>) -> Self {
        self.config.spreadsheet = SpreadsheetRef::Id(id.into());
        self
    }

    pub fn spreadsheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.spreadsheet = SpreadsheetRef::Name(name.into());
        self
    }

    pub fn image_worksheet(mut self, name: impl Into<String>) -> Self {
        self.config.image_worksheet = name.into();
        self
    }

    pub fn lab_worksheet(mut self, name: impl Into<String>) -> Self {
        self.config.lab_worksheet = name.into();
        self
    }

    pub fn persist_by_default(mut self, v: bool) -> Self {
        self.config.persist_by_default = v;
        self
    }

    pub fn ocr_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.ocr_command = cmd.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, IntakeError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(IntakeError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.download_timeout_secs == 0 {
            return Err(IntakeError::InvalidConfig(
                "download_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.ocr_command.trim().is_empty() {
            return Err(IntakeError::InvalidConfig(
                "ocr_command must not be empty".into(),
            ));
        }
        match &c.spreadsheet {
            SpreadsheetRef::Id(s) | SpreadsheetRef::Name(s) if s.trim().is_empty() => {
                return Err(IntakeError::InvalidConfig(
                    "spreadsheet reference must not be empty".into(),
                ));
            }
            _ => {}
        }
        Ok(self.config)
    }
}
