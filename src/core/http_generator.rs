//! Content generator backed by the quiz backend's `/api/gemini` route
//!
//! Request: `{"prompt": "...", "image": "<base64>"?}`
//! Response: `{"ai_text": "..."}` or `{"error": "..."}`

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::Config;
use crate::core::generator::{ContentGenerator, GenerateRequest};
use crate::error::GenerationError;

const GENERATE_PATH: &str = "/api/gemini";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    ai_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the generator backend
#[derive(Debug, Clone)]
pub struct HttpContentGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpContentGenerator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        Self::new(config.generator_url.clone(), config.generator_timeout)
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GENERATE_PATH)
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerationError> {
        let url = self.endpoint();
        debug!(%url, prompt_len = request.prompt.len(), "requesting generation");

        let resp = self.client.post(&url).json(&request).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            // Backend reports failures as {"error": "..."} with a 5xx
            let body = String::from_utf8_lossy(&bytes).to_string();
            if let Ok(GenerateResponse { error: Some(msg), .. }) = serde_json::from_slice::<GenerateResponse>(&bytes) {
                error!(?status, error = %msg, "generator backend error");
                return Err(GenerationError::Backend(msg));
            }
            return Err(GenerationError::HttpStatus { status, body });
        }

        let parsed: GenerateResponse = serde_json::from_slice(&bytes)?;
        if let Some(msg) = parsed.error {
            return Err(GenerationError::Backend(msg));
        }
        parsed
            .ai_text
            .filter(|t| !t.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}
