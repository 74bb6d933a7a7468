//! Provider transports: one network request to one external provider.
//!
//! A transport knows how to talk to exactly one provider and nothing else.
//! It performs a single attempt and classifies the outcome into a
//! [`RawResponse`] or a [`ProviderError`]; retry policy lives one level up in
//! [`crate::pipeline::client`], and shape-specific parsing one level further in
//! [`crate::pipeline::normalize`].
//!
//! Two implementations ship with the crate:
//!
//! * [`HuggingFaceTransport`]: HTTPS `POST {base}/{model}` with a
//!   `{"inputs": ...}` body and bearer auth. Reports the "model is loading"
//!   marker as [`ProviderError::ModelLoading`] so the client can wait longer.
//! * [`ChatCompletionTransport`]: a system + user chat turn sent through an
//!   [`edgequake_llm::LLMProvider`] (OpenAI by default).

use crate::error::{ProviderError, StudyError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Longest response body excerpt kept in an error message.
const ERROR_BODY_LIMIT: usize = 300;

/// Identity of a provider tier in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// Dedicated summarisation model on Hugging Face inference.
    HuggingFaceSummarizer,
    /// Free-form text-generation model on Hugging Face inference.
    HuggingFaceTextGeneration,
    /// General-purpose chat-completion provider.
    ChatCompletion,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::HuggingFaceSummarizer => "huggingface-summarizer",
            ProviderId::HuggingFaceTextGeneration => "huggingface-textgen",
            ProviderId::ChatCompletion => "chat-completion",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderPayload {
    /// Raw `inputs` string for an inference endpoint.
    Inputs(String),
    /// A system instruction plus one user turn.
    Chat {
        system: String,
        user: String,
        max_tokens: usize,
    },
}

impl ProviderPayload {
    /// Collapse into a single prompt string for endpoints that only take one.
    pub fn as_inputs(&self) -> String {
        match self {
            ProviderPayload::Inputs(s) => s.clone(),
            ProviderPayload::Chat { system, user, .. } => format!("{}\n\n{}", system, user),
        }
    }
}

/// Provider response before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// Parsed JSON body (inference endpoints).
    Json(Value),
    /// Free-form completion text (chat providers, non-JSON bodies).
    Text(String),
}

/// One attempt against one provider.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Which chain tier this transport serves.
    fn id(&self) -> ProviderId;

    /// Issue a single request. No retries.
    async fn send(&self, payload: &ProviderPayload) -> Result<RawResponse, ProviderError>;
}

// ── Hugging Face inference ───────────────────────────────────────────────

/// Hugging Face inference API transport for a single model.
pub struct HuggingFaceTransport {
    id: ProviderId,
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl HuggingFaceTransport {
    /// Build a transport for `{base_url}/{model}`.
    pub fn new(
        id: ProviderId,
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, StudyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StudyError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            id,
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model),
            api_key,
            timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify_reqwest(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout {
                provider: self.id,
                secs: self.timeout_secs,
            }
        } else {
            ProviderError::Transport {
                provider: self.id,
                detail: e.to_string(),
            }
        }
    }
}

impl fmt::Debug for HuggingFaceTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceTransport")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[async_trait]
impl ProviderTransport for HuggingFaceTransport {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn send(&self, payload: &ProviderPayload) -> Result<RawResponse, ProviderError> {
        let body = json!({ "inputs": payload.as_inputs() });
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.classify_reqwest(e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.classify_reqwest(e))?;
        debug!("{}: HTTP {} ({} bytes)", self.id, status, text.len());

        interpret_response(self.id, status, &text)
    }
}

/// Classify an inference-endpoint reply.
///
/// The `error` field is checked before the status code: the loading marker
/// arrives with a 503, and must still be reported as
/// [`ProviderError::ModelLoading`].
pub(crate) fn interpret_response(
    provider: ProviderId,
    status: u16,
    body: &str,
) -> Result<RawResponse, ProviderError> {
    let success = (200..300).contains(&status);

    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            if let Some(message) = value.get("error").and_then(Value::as_str) {
                let message = message.to_string();
                return Err(if message.to_lowercase().contains("loading") {
                    ProviderError::ModelLoading { provider, message }
                } else {
                    ProviderError::Api { provider, message }
                });
            }
            if !success {
                return Err(ProviderError::Http {
                    provider,
                    status,
                    body: excerpt(body),
                });
            }
            Ok(RawResponse::Json(value))
        }
        Err(_) if success => Ok(RawResponse::Text(body.to_string())),
        Err(_) => Err(ProviderError::Http {
            provider,
            status,
            body: excerpt(body),
        }),
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_LIMIT {
        let cut: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{}\u{2026}", cut)
    } else {
        body.to_string()
    }
}

// ── Chat completion ──────────────────────────────────────────────────────

/// Chat-completion transport over an `edgequake-llm` provider.
pub struct ChatCompletionTransport {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    timeout_secs: u64,
}

impl ChatCompletionTransport {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, timeout_secs: u64) -> Self {
        Self {
            provider,
            temperature,
            timeout_secs,
        }
    }
}

#[async_trait]
impl ProviderTransport for ChatCompletionTransport {
    fn id(&self) -> ProviderId {
        ProviderId::ChatCompletion
    }

    async fn send(&self, payload: &ProviderPayload) -> Result<RawResponse, ProviderError> {
        let (messages, max_tokens) = match payload {
            ProviderPayload::Chat {
                system,
                user,
                max_tokens,
            } => (
                vec![ChatMessage::system(system), ChatMessage::user(user)],
                Some(*max_tokens),
            ),
            ProviderPayload::Inputs(inputs) => (vec![ChatMessage::user(inputs)], None),
        };

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens,
            ..Default::default()
        };

        let call = self.provider.chat(&messages, Some(&options));
        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| ProviderError::Timeout {
                provider: ProviderId::ChatCompletion,
                secs: self.timeout_secs,
            })?
            .map_err(|e| ProviderError::Api {
                provider: ProviderId::ChatCompletion,
                message: e.to_string(),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            ProviderId::ChatCompletion,
            response.prompt_tokens,
            response.completion_tokens
        );

        Ok(RawResponse::Text(response.content))
    }
}
