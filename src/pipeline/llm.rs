//! Structuring call: send extracted text to the LLM and collect the reply.
//!
//! This module is intentionally thin — all prompt wording lives in
//! [`crate::prompts`] so it can be changed without touching retry or
//! error-handling logic here.
//!
//! ## Retry strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^(attempt - 1)`) avoids
//! hammering a recovering endpoint: with the 500 ms default and 3 retries
//! the wait sequence is 500 ms, 1 s, 2 s.

use crate::config::ServiceConfig;
use crate::error::IntakeError;
use crate::prompts::Purpose;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// The raw model reply plus token accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The model's single text response, fences and all.
    pub content: String,
    /// Prompt tokens reported by the provider.
    pub input_tokens: usize,
    /// Completion tokens reported by the provider.
    pub output_tokens: usize,
    /// Retries consumed before this reply arrived.
    pub retries: u32,
}

/// Seam between the pipeline and the language model.
///
/// Production uses [`LlmStructurer`]; tests substitute a canned fake.
#[async_trait]
pub trait Structurer: Send + Sync {
    /// Ask the model to structure `text` according to `purpose`.
    async fn structure(&self, purpose: Purpose, text: &str) -> Result<Completion, IntakeError>;
}

/// Structurer backed by an `edgequake-llm` chat provider.
pub struct LlmStructurer {
    provider: Arc<dyn LLMProvider>,
    system_prompt: Option<String>,
    temperature: f32,
    max_tokens: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_timeout_secs: u64,
}

impl LlmStructurer {
    /// Wrap a pre-built provider. Useful when the caller needs custom
    /// middleware around the provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ServiceConfig) -> Self {
        Self {
            provider,
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
        }
    }

    /// Resolve a provider from config and environment, then wrap it.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, IntakeError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl Structurer for LlmStructurer {
    async fn structure(&self, purpose: Purpose, text: &str) -> Result<Completion, IntakeError> {
        let system = self
            .system_prompt
            .as_deref()
            .unwrap_or_else(|| purpose.system_prompt());
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(purpose.user_prompt(text)),
        ];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Structuring retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            let call = self.provider.chat(&messages, Some(&options));
            match timeout(Duration::from_secs(self.api_timeout_secs), call).await {
                Ok(Ok(response)) => {
                    debug!(
                        "Structuring reply: {} input tokens, {} output tokens",
                        response.prompt_tokens, response.completion_tokens
                    );
                    return Ok(Completion {
                        content: response.content,
                        input_tokens: response.prompt_tokens as usize,
                        output_tokens: response.completion_tokens as usize,
                        retries: attempt,
                    });
                }
                Ok(Err(e)) => {
                    let msg = format!("{e}");
                    warn!("Structuring attempt {} failed: {}", attempt + 1, msg);
                    last_err = Some(msg);
                }
                Err(_) => {
                    let msg = format!("timed out after {}s", self.api_timeout_secs);
                    warn!("Structuring attempt {} {}", attempt + 1, msg);
                    last_err = Some(msg);
                }
            }
        }

        Err(IntakeError::StructuringFailed {
            retries: self.max_retries,
            detail: last_err.unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Named provider + model** (`config.provider_name`) — reads the
///    corresponding API key from the environment.
/// 2. **OpenAI key present** — prefer OpenAI explicitly so deployments with
///    multiple keys get a deterministic choice.
/// 3. **Full auto-detection** — scan all known API key variables and pick
///    the first available provider.
pub fn resolve_provider(config: &ServiceConfig) -> Result<Arc<dyn LLMProvider>, IntakeError> {
    let model = config.model.as_deref().unwrap_or("gpt-4o-mini");

    if let Some(ref name) = config.provider_name {
        return ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            IntakeError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("{e}"),
            }
        });
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            return ProviderFactory::create_llm_provider("openai", model).map_err(|e| {
                IntakeError::ProviderNotConfigured {
                    provider: "openai".to_string(),
                    hint: format!("{e}"),
                }
            });
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| IntakeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                 Set OPENAI_API_KEY or configure a provider.\nError: {e}"
            ),
        })?;

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_options_carry_config_knobs() {
        let options = CompletionOptions {
            temperature: Some(0.2),
            max_tokens: Some(4096),
            ..Default::default()
        };
        assert_eq!(options.temperature, Some(0.2));
        assert_eq!(options.max_tokens, Some(4096));
    }
}
