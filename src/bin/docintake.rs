//! CLI binary for docintake.
//!
//! A thin shim over the library crate: maps CLI flags and environment
//! variables to a `ServiceConfig`, constructs the real Google/LLM clients,
//! and serves the webhook routes.

use anyhow::{Context, Result};
use clap::Parser;
use docintake::google::auth::ServiceAccountAuth;
use docintake::google::drive::DriveFiles;
use docintake::google::sheets::SheetsAppender;
use docintake::{build_app, Deps, LlmStructurer, LocalExtractor, ServiceConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "docintake",
    version,
    about = "Webhook service: Drive document link → OCR/PDF text → LLM-structured JSON → spreadsheet row"
)]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// LLM model identifier.
    #[arg(long, env = "DOCINTAKE_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// LLM provider name (e.g. "openai"). Auto-detected from API keys in
    /// the environment when omitted.
    #[arg(long, env = "DOCINTAKE_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature for the structuring call.
    #[arg(long, default_value_t = 0.2)]
    temperature: f32,

    /// Destination spreadsheet ID. Takes precedence over --spreadsheet-name.
    #[arg(long, env = "DOCINTAKE_SPREADSHEET_ID")]
    spreadsheet_id: Option<String>,

    /// Destination spreadsheet title, resolved via Drive.
    #[arg(
        long,
        env = "DOCINTAKE_SPREADSHEET_NAME",
        default_value = "Online Clients Weight Analysis NEW (Responses)"
    )]
    spreadsheet_name: String,

    /// Worksheet receiving image-pipeline rows.
    #[arg(long, default_value = "Image Data")]
    image_worksheet: String,

    /// Worksheet receiving lab-report rows.
    #[arg(long, default_value = "Lab Reports")]
    lab_worksheet: String,

    /// Skip the spreadsheet append unless a request opts in with
    /// ?persist=true.
    #[arg(long)]
    no_persist: bool,

    /// OCR command to invoke for image extraction.
    #[arg(long, env = "DOCINTAKE_OCR_CMD", default_value = "tesseract")]
    ocr_command: String,

    /// OCR language code.
    #[arg(long, env = "DOCINTAKE_OCR_LANG", default_value = "eng")]
    ocr_language: String,

    /// Drive download timeout in seconds.
    #[arg(long, default_value_t = 120)]
    download_timeout_secs: u64,

    /// Per-LLM-call timeout in seconds.
    #[arg(long, default_value_t = 60)]
    api_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,docintake=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut builder = ServiceConfig::builder()
        .model(&cli.model)
        .temperature(cli.temperature)
        .image_worksheet(&cli.image_worksheet)
        .lab_worksheet(&cli.lab_worksheet)
        .persist_by_default(!cli.no_persist)
        .ocr_command(&cli.ocr_command)
        .ocr_language(&cli.ocr_language)
        .download_timeout_secs(cli.download_timeout_secs)
        .api_timeout_secs(cli.api_timeout_secs)
        .port(cli.port);

    if let Some(provider) = &cli.provider {
        builder = builder.provider_name(provider);
    }
    builder = match &cli.spreadsheet_id {
        Some(id) => builder.spreadsheet_id(id),
        None => builder.spreadsheet_name(&cli.spreadsheet_name),
    };

    let config = Arc::new(builder.build().context("invalid configuration")?);

    // Fail fast: no credentials, no service.
    let auth = Arc::new(
        ServiceAccountAuth::from_env()
            .context("GOOGLE_CREDENTIALS must hold the service-account JSON key")?,
    );
    tracing::info!("Authenticating as {}", auth.client_email());

    let deps = Deps {
        files: Arc::new(
            DriveFiles::new(auth.clone(), config.download_timeout_secs)
                .context("failed to build Drive client")?,
        ),
        extractor: Arc::new(LocalExtractor::new(
            &config.ocr_command,
            &config.ocr_language,
        )),
        structurer: Arc::new(
            LlmStructurer::from_config(&config).context("failed to resolve an LLM provider")?,
        ),
        sink: Arc::new(SheetsAppender::new(auth, config.spreadsheet.clone())),
    };

    let app = build_app(deps, config.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("docintake listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
