//! The completion oracle: the external service that performs the actual
//! rewrite given a prompt.
//!
//! The pipeline only depends on the [`CompletionOracle`] capability trait;
//! [`OpenAiOracle`] is the production implementation, backed by an
//! OpenAI-style completions endpoint and a filesystem response cache.

use crate::cache::ResponseCache;
use crate::prompt::Prompt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("completion returned zero alternatives")]
    NoChoices,

    #[error("failed to decode completion response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response cache I/O error: {0}")]
    Cache(#[from] std::io::Error),
}

/// The interface the pipeline needs from a text-completion service: given a
/// prompt, token budget, and stop sequence, return the first generated
/// alternative. Zero alternatives is a contract violation.
pub trait CompletionOracle: Sync {
    fn complete(&self, prompt: &Prompt) -> Result<String, OracleError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
    temperature: f32,
    stop: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/completions";

/// Completion oracle backed by an OpenAI-style `/v1/completions` endpoint.
pub struct OpenAiOracle {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    cache: ResponseCache,
}

impl OpenAiOracle {
    pub fn new(api_key: String, model: String, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            model,
            cache: ResponseCache::new(cache_root),
        }
    }

    /// Override the endpoint (for self-hosted gateways and tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn fetch(&self, request: &CompletionRequest<'_>) -> Result<String, OracleError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(OracleError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }
}

impl CompletionOracle for OpenAiOracle {
    fn complete(&self, prompt: &Prompt) -> Result<String, OracleError> {
        let request = CompletionRequest {
            model: &self.model,
            prompt: &prompt.text,
            max_tokens: prompt.max_tokens,
            temperature: 0.0,
            stop: &prompt.stop,
        };
        let key = request_key(&request)?;

        let raw = match self.cache.get(&key) {
            Some(raw) => {
                debug!("reading response from cache");
                raw
            }
            None => {
                let raw = self.fetch(&request)?;
                self.cache.set(&key, &raw)?;
                raw
            }
        };

        first_choice(&raw)
    }
}

/// Stable cache key over the full request payload.
fn request_key(request: &CompletionRequest<'_>) -> Result<String, OracleError> {
    let bytes = serde_json::to_vec(request)?;
    Ok(format!("{:016x}", xxh3_64(&bytes)))
}

fn first_choice(raw: &str) -> Result<String, OracleError> {
    let response: CompletionResponse = serde_json::from_str(raw)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or(OracleError::NoChoices)
}
