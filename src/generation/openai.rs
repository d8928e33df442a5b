//! OpenAI-compatible chat completions client.
//!
//! Sends a single user message to `/v1/chat/completions` and returns the
//! content of the first choice. There is no retry: a failed call is
//! terminal for the task that issued it.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GenerationError, GenerationParams, Generator};
use crate::config::LabConfig;
use crate::{Error, Result};

/// Per-request ceiling; the orchestrator deadline usually fires first.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP generation collaborator.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiClient {
    /// Create a client for `base_url` (e.g. `https://api.openai.com`).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: impl Into<String>, max_tokens: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_tokens,
        })
    }

    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid or has no API key.
    pub fn from_config(config: &LabConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("api_key is not set".to_string()))?;
        Self::new(&config.base_url, api_key, config.max_tokens)
    }

    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl Generator for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> std::result::Result<String, GenerationError> {
        debug!(
            model = %params.model,
            temperature = params.temperature,
            top_p = params.top_p,
            "Requesting completion"
        );

        let request = ChatRequest {
            model: &params.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Completion request rejected");
            return Err(map_status(status, &body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Other(format!("Failed to parse response: {e}")))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        debug!(chars = content.len(), "Completion received");
        Ok(content)
    }
}

/// Map a non-success HTTP status to a labeled error.
fn map_status(status: StatusCode, body: &str) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::Unauthorized(format!("provider rejected credentials ({status})"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            GenerationError::RateLimited(format!("provider throttled request ({status})"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            GenerationError::Network(format!("provider timed out ({status})"))
        }
        _ => GenerationError::Other(format!("provider returned {status}: {body}")),
    }
}
