//! Generation orchestrator: provider chain first, local fallback last.
//!
//! [`Generator::run`] never fails. When every provider for a task is
//! exhausted the [`fallback`] generator synthesises the artifact from the
//! document text instead, so callers always get something to persist.

use crate::artifact::{Artifact, ArtifactOrigin, GenerationTask};
use crate::config::GenerationConfig;
use crate::error::{GenerationError, ProviderAttempt, StudyError};
use crate::pipeline::chain::ProviderChain;
use crate::pipeline::client::ProviderClient;
use crate::pipeline::fallback;
use crate::pipeline::transport::{ChatCompletionTransport, HuggingFaceTransport, ProviderId};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub task: GenerationTask,
    pub text: String,
    /// Previously stored summary of the same document, if any.
    pub summary: Option<String>,
}

impl GenerationRequest {
    pub fn new(task: GenerationTask, text: impl Into<String>) -> Self {
        Self {
            task,
            text: text.into(),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// The artifact and how it was obtained.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub artifact: Artifact,
    pub origin: ArtifactOrigin,
    /// Failed provider attempts, in chain order.
    pub attempts: Vec<ProviderAttempt>,
    pub duration_ms: u64,
}

/// Drives the provider chain and falls back locally on exhaustion.
pub struct Generator {
    chain: ProviderChain,
}

impl Generator {
    pub fn new(chain: ProviderChain) -> Self {
        Self { chain }
    }

    /// Build the chain and register every provider `config` can reach.
    ///
    /// Hugging Face tiers need an API key. The chat tier is resolved from a
    /// pre-built provider, else from `chat_provider_name` + `chat_model`. A
    /// provider that cannot be constructed is logged and skipped.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, StudyError> {
        let mut chain = ProviderChain::new(ProviderClient::new(config.retry_policy()), config);

        if config.huggingface_api_key.is_some() {
            for (id, model) in [
                (ProviderId::HuggingFaceSummarizer, &config.summarization_model),
                (
                    ProviderId::HuggingFaceTextGeneration,
                    &config.text_generation_model,
                ),
            ] {
                let transport = HuggingFaceTransport::new(
                    id,
                    &config.huggingface_base_url,
                    model,
                    config.huggingface_api_key.clone(),
                    config.request_timeout_secs,
                )?;
                debug!("Registered {} at {}", id, transport.endpoint());
                chain = chain.with_transport(Arc::new(transport));
            }
        } else {
            debug!("No Hugging Face API key; skipping Hugging Face providers");
        }

        match resolve_chat_provider(config) {
            Some(provider) => {
                debug!("Registered {} ({})", ProviderId::ChatCompletion, config.chat_model);
                chain = chain.with_transport(Arc::new(ChatCompletionTransport::new(
                    provider,
                    config.temperature,
                    config.request_timeout_secs,
                )));
            }
            None => debug!("No chat provider configured"),
        }

        Ok(Self::new(chain))
    }

    /// A generator with no providers: every request is served by the
    /// local fallback.
    pub fn offline() -> Self {
        let config = GenerationConfig::default();
        Self::new(ProviderChain::new(
            ProviderClient::new(config.retry_policy()),
            &config,
        ))
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Produce the artifact for `task`. Never fails.
    pub async fn run(&self, task: GenerationTask, text: &str) -> Artifact {
        self.generate(GenerationRequest::new(task, text))
            .await
            .artifact
    }

    /// Produce the artifact for `request`, with its origin and attempt log.
    pub async fn generate(&self, request: GenerationRequest) -> GenerationOutcome {
        let start = Instant::now();
        let task = request.task;

        let (artifact, origin, attempts) = match self.chain.generate(task, &request.text).await {
            Ok(output) => (
                output.artifact,
                ArtifactOrigin::Provider(output.provider),
                output.attempts,
            ),
            Err(err) => {
                info!("{}; using local fallback", err);
                let GenerationError::AllProvidersExhausted { attempts, .. } = err;
                let artifact =
                    fallback::generate(task, &request.text, request.summary.as_deref());
                (artifact, ArtifactOrigin::Fallback, attempts)
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "{}: {} item(s) in {}ms ({} failed attempt(s))",
            task,
            artifact.len(),
            duration_ms,
            attempts.len()
        );

        GenerationOutcome {
            artifact,
            origin,
            attempts,
            duration_ms,
        }
    }
}

/// Resolve the chat provider, from most-specific to least-specific.
fn resolve_chat_provider(config: &GenerationConfig) -> Option<Arc<dyn LLMProvider>> {
    if let Some(ref provider) = config.chat_provider {
        return Some(Arc::clone(provider));
    }

    let name = config.chat_provider_name.as_deref()?;
    match ProviderFactory::create_llm_provider(name, &config.chat_model) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!(
                "Chat provider '{}' ({}) could not be created, skipping: {}",
                name, config.chat_model, e
            );
            None
        }
    }
}
