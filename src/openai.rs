// src/openai.rs

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use url::Url;

use crate::config::{ApiFlavor, AppConfig};
use crate::error::{AppError, GenerationError, Result};
use crate::models::{self, ThreadSummaryResponse};

/// One request against the generation API, built fresh per chunk.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub user_content: &'a str,
    pub max_output_tokens: u32,
}

/// Thin adapter over the OpenAI Responses API: one structured-output call
/// and one free-text call, both normalized into internal result types.
/// Does not retry; every failure surfaces as a single `GenerationError`.
pub struct GenerationClient {
    http: reqwest::Client,
    responses_url: Url,
    api_key: SecretString,
}

impl GenerationClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let responses_url = config.api_base.join("v1/responses")?;
        Ok(Self {
            http,
            responses_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Checked once at startup, before any chunk is processed. A provider
    /// configured for a surface without structured output must stop the run
    /// here rather than produce a silently degraded artifact.
    pub fn ensure_structured_output_support(config: &AppConfig) -> Result<()> {
        match config.api_flavor {
            ApiFlavor::Responses => Ok(()),
            ApiFlavor::ChatCompletions => Err(AppError::StructuredOutputUnsupported(
                "the chat-completions API surface cannot enforce a response schema; \
                 configure --api-flavor responses"
                    .to_string(),
            )),
        }
    }

    /// Shared HTTP client, reused for the thread download.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Issues a schema-constrained request and extracts the parsed summary
    /// rows. An HTTP-level success that yields no usable rows is still a
    /// failure to the caller.
    pub async fn generate_structured(
        &self,
        request: &GenerationRequest<'_>,
    ) -> std::result::Result<ThreadSummaryResponse, GenerationError> {
        let mut body = base_payload(request);
        body["text"] = json!({
            "format": {
                "type": "json_schema",
                "name": "thread_summary",
                "strict": true,
                "schema": models::response_schema(),
            }
        });
        let response = self.post(&body).await?;
        extract_structured(&response).ok_or(GenerationError::EmptyResponse)
    }

    /// Issues an unconstrained request and extracts free text.
    pub async fn generate_text(
        &self,
        request: &GenerationRequest<'_>,
    ) -> std::result::Result<String, GenerationError> {
        let body = base_payload(request);
        let response = self.post(&body).await?;
        let text = extract_text(&response);
        if text.is_empty() {
            Err(GenerationError::EmptyResponse)
        } else {
            Ok(text)
        }
    }

    async fn post(&self, body: &Value) -> std::result::Result<Value, GenerationError> {
        let response = self
            .http
            .post(self.responses_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

fn base_payload(request: &GenerationRequest<'_>) -> Value {
    json!({
        "model": request.model,
        "input": [
            {
                "role": "system",
                "content": [{ "type": "input_text", "text": request.system_instruction }]
            },
            {
                "role": "user",
                "content": [{ "type": "input_text", "text": request.user_content }]
            }
        ],
        "max_output_tokens": request.max_output_tokens,
    })
}

/// Normalizes the provider's polymorphic structured payloads. Shape
/// detectors run in a fixed priority order and the first non-empty result
/// wins: a directly attached parsed object, then parsed payloads embedded
/// in output items, then a last-resort re-parse of embedded text as JSON.
pub fn extract_structured(response: &Value) -> Option<ThreadSummaryResponse> {
    if let Some(parsed) = response.get("output_parsed") {
        if let Some(result) = parse_summary(parsed) {
            return Some(result);
        }
    }

    for content in output_contents(response) {
        if let Some(parsed) = content.get("parsed") {
            if let Some(result) = parse_summary(parsed) {
                return Some(result);
            }
        }
    }

    for content in output_contents(response) {
        if let Some(text) = content.get("text").and_then(Value::as_str) {
            if let Ok(result) = serde_json::from_str::<ThreadSummaryResponse>(text) {
                if !result.summaries.is_empty() {
                    return Some(result);
                }
            }
        }
    }

    None
}

/// Extracts plain text: a direct `output_text` field (string or fragment
/// list) first, then a scan of output item contents. Fragments are joined
/// with newlines and the result is trimmed.
pub fn extract_text(response: &Value) -> String {
    match response.get("output_text") {
        Some(Value::String(text)) if !text.trim().is_empty() => {
            return text.trim().to_string();
        }
        Some(Value::Array(fragments)) => {
            let joined = fragments
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            if !joined.trim().is_empty() {
                return joined.trim().to_string();
            }
        }
        _ => {}
    }

    let texts: Vec<&str> = output_contents(response)
        .filter_map(|content| content.get("text").and_then(Value::as_str))
        .filter(|t| !t.is_empty())
        .collect();
    texts.join("\n").trim().to_string()
}

fn output_contents(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
}

fn parse_summary(value: &Value) -> Option<ThreadSummaryResponse> {
    // Parsed payloads arrive as a single object or a list of candidates.
    match value {
        Value::Array(candidates) => candidates.iter().find_map(parse_summary),
        _ => serde_json::from_value::<ThreadSummaryResponse>(value.clone())
            .ok()
            .filter(|result| !result.summaries.is_empty()),
    }
}
