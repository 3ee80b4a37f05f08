//! Remote text generation
//!
//! Maps a provider to its fixed request shape over an abstract POST
//! transport and pulls the first generated text field out of the response.
//! Failure is opaque to callers: one attempt, no retry, no partial result.

use crate::config::{ModelConfig, Provider};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: usize = 4096;

/// Generic JSON-over-HTTP POST capability.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn post(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value>;
}

/// A fully built provider request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

/// Build the request shape for a provider. Anthropic takes a system string
/// plus a message list; OpenAI takes the system prompt as a leading chat
/// message. Empty system prompts are omitted.
pub fn build_request(
    model: &ModelConfig,
    api_key: &str,
    system_prompt: &str,
    user_prompt: &str,
) -> ProviderRequest {
    match model.provider {
        Provider::Anthropic => {
            let mut body = json!({
                "model": model.model,
                "max_tokens": MAX_TOKENS,
                "messages": [{"role": "user", "content": user_prompt}],
            });
            if !system_prompt.is_empty() {
                body["system"] = json!(system_prompt);
            }
            ProviderRequest {
                url: ANTHROPIC_URL.to_string(),
                headers: vec![
                    ("x-api-key".to_string(), api_key.to_string()),
                    ("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()),
                ],
                body,
            }
        }
        Provider::Openai => {
            let mut messages = Vec::new();
            if !system_prompt.is_empty() {
                messages.push(json!({"role": "system", "content": system_prompt}));
            }
            messages.push(json!({"role": "user", "content": user_prompt}));
            ProviderRequest {
                url: OPENAI_URL.to_string(),
                headers: vec![(
                    "authorization".to_string(),
                    format!("Bearer {api_key}"),
                )],
                body: json!({"model": model.model, "messages": messages}),
            }
        }
    }
}

/// First generated text field of a provider response, if present.
pub fn extract_text(provider: Provider, response: &Value) -> Option<String> {
    let text = match provider {
        Provider::Anthropic => response.get("content")?.get(0)?.get("text")?,
        Provider::Openai => response
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?,
    };
    text.as_str().map(str::to_string)
}

/// Run one generation call against `transport`.
pub async fn generate(
    transport: &dyn GenerationTransport,
    model: &ModelConfig,
    api_key: &str,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String> {
    let request = build_request(model, api_key, system_prompt, user_prompt);
    let response = transport.post(&request.url, &request.headers, &request.body).await?;
    extract_text(model.provider, &response)
        .ok_or_else(|| Error::External("no generated text in provider response".to_string()))
}

/// Production transport over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GenerationTransport for HttpTransport {
    async fn post(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value> {
        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::External(format!("API error {status}: {text}")));
        }
        Ok(response.json().await?)
    }
}
