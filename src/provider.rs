//! The remote boundary: one multimodal request in, raw response text out.
//!
//! [`SolveProvider`] is the seam. [`GeminiProvider`] implements it against
//! the Generative Language API's `generateContent` endpoint; tests and
//! embedders can inject their own through
//! [`crate::config::SolverConfig::provider`].
//!
//! The provider does not interpret the response. It returns the text of the
//! first candidate and leaves schema validation to
//! [`crate::pipeline::postprocess::parse_response`].

use crate::error::ProviderError;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Everything one solve request sends to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// MIME type of the attached file.
    pub mime_type: String,
    /// Base64 payload, without the `data:` prefix.
    pub data: String,
    /// Natural-language instruction placed after the attachment.
    pub instruction: String,
    /// Declared JSON shape of the answer.
    pub response_schema: Value,
    pub temperature: f32,
    pub thinking_budget: u32,
}

/// A remote model that answers a [`GenerateRequest`] with JSON text.
pub trait SolveProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Send one request and return the raw text of the answer.
    fn generate<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}

/// Gemini `generateContent` client.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    /// Create a client. `timeout_secs` of `None` leaves the request unbounded.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Full endpoint URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn send(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let body = GeminiRequest::from(request);
        let url = self.endpoint();
        debug!(
            "POST {} ({} bytes of {} payload)",
            url,
            request.data.len(),
            request.mime_type
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        parsed.into_text()
    }
}

impl SolveProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        self.send(request).boxed()
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        data: &'a str,
    },
    Text(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl<'a> From<&'a GenerateRequest> for GeminiRequest<'a> {
    fn from(r: &'a GenerateRequest) -> Self {
        GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::InlineData {
                        mime_type: &r.mime_type,
                        data: &r.data,
                    },
                    Part::Text(&r.instruction),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &r.response_schema,
                temperature: r.temperature,
                thinking_config: ThinkingConfig {
                    thinking_budget: r.thinking_budget,
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiResponse {
    /// Concatenate the non-thought text parts of the first candidate.
    fn into_text(self) -> Result<String, ProviderError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Blocked { reason });
        }
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(ProviderError::EmptyResponse);
        };
        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();
        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_default();
            if matches!(reason.as_str(), "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST") {
                return Err(ProviderError::Blocked { reason });
            }
            // An empty answer still parses: the caller falls back to defaults.
            debug!("Candidate carried no text (finish reason '{}')", reason);
        }
        Ok(text)
    }
}
