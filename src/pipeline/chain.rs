//! Provider chain: ordered, sequential fallback across providers.
//!
//! ## Routing
//!
//! | Task | Order |
//! |------|-------|
//! | summarize  | Hugging Face summariser (1024 chars) → chat completion (1024 chars) |
//! | flashcards | Hugging Face text generation (500 chars) → chat completion (500 chars) |
//! | quiz       | chat completion (500 chars) |
//!
//! Quiz generation has a single tier.
//!
//! Providers are tried one at a time, never raced. The first response that
//! normalises into a non-empty artifact wins; any provider or parse failure
//! is logged, recorded as a [`ProviderAttempt`] and the next provider runs.

use crate::artifact::{Artifact, GenerationTask};
use crate::config::GenerationConfig;
use crate::error::{AttemptError, GenerationError, ProviderAttempt, ProviderError};
use crate::pipeline::client::ProviderClient;
use crate::pipeline::normalize;
use crate::pipeline::transport::{ProviderId, ProviderTransport};
use crate::prompts;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// One entry of a task's route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub provider: ProviderId,
    /// Characters of source text embedded in the request; `None` = all.
    pub input_limit: Option<usize>,
}

impl ProviderDescriptor {
    pub fn new(provider: ProviderId, input_limit: Option<usize>) -> Self {
        Self {
            provider,
            input_limit,
        }
    }
}

/// The fixed provider order for `task`.
pub fn default_route(task: GenerationTask, config: &GenerationConfig) -> Vec<ProviderDescriptor> {
    match task {
        GenerationTask::Summarize => vec![
            ProviderDescriptor::new(
                ProviderId::HuggingFaceSummarizer,
                Some(config.summary_input_limit),
            ),
            ProviderDescriptor::new(ProviderId::ChatCompletion, Some(config.summary_input_limit)),
        ],
        GenerationTask::Flashcards => vec![
            ProviderDescriptor::new(
                ProviderId::HuggingFaceTextGeneration,
                Some(config.prompt_input_limit),
            ),
            ProviderDescriptor::new(ProviderId::ChatCompletion, Some(config.prompt_input_limit)),
        ],
        GenerationTask::Quiz => vec![ProviderDescriptor::new(
            ProviderId::ChatCompletion,
            Some(config.prompt_input_limit),
        )],
    }
}

/// A successful chain run.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub artifact: Artifact,
    pub provider: ProviderId,
    /// Providers that failed before `provider` answered.
    pub attempts: Vec<ProviderAttempt>,
}

/// Routes, transports and the retrying client that drives them.
pub struct ProviderChain {
    client: ProviderClient,
    transports: HashMap<ProviderId, Arc<dyn ProviderTransport>>,
    routes: HashMap<GenerationTask, Vec<ProviderDescriptor>>,
}

impl ProviderChain {
    /// A chain with the default routes for `config` and no transports yet.
    pub fn new(client: ProviderClient, config: &GenerationConfig) -> Self {
        let routes = GenerationTask::ALL
            .iter()
            .map(|&task| (task, default_route(task, config)))
            .collect();
        Self {
            client,
            transports: HashMap::new(),
            routes,
        }
    }

    /// Register the transport serving its [`ProviderTransport::id`].
    pub fn with_transport(mut self, transport: Arc<dyn ProviderTransport>) -> Self {
        self.transports.insert(transport.id(), transport);
        self
    }

    /// Replace the route for one task.
    pub fn with_route(mut self, task: GenerationTask, route: Vec<ProviderDescriptor>) -> Self {
        self.routes.insert(task, route);
        self
    }

    pub fn route(&self, task: GenerationTask) -> &[ProviderDescriptor] {
        self.routes.get(&task).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_transport(&self, provider: ProviderId) -> bool {
        self.transports.contains_key(&provider)
    }

    /// Try each provider in the task's route until one yields an artifact.
    pub async fn generate(
        &self,
        task: GenerationTask,
        text: &str,
    ) -> Result<ChainOutput, GenerationError> {
        let mut attempts = Vec::new();

        for descriptor in self.route(task) {
            let provider = descriptor.provider;
            match self.attempt(task, descriptor, text).await {
                Ok(artifact) => {
                    info!("{}: generated by {}", task, provider);
                    return Ok(ChainOutput {
                        artifact,
                        provider,
                        attempts,
                    });
                }
                Err(error) => {
                    warn!("{}: {} unavailable, trying next provider: {}", task, provider, error);
                    attempts.push(ProviderAttempt { provider, error });
                }
            }
        }

        Err(GenerationError::AllProvidersExhausted { task, attempts })
    }

    async fn attempt(
        &self,
        task: GenerationTask,
        descriptor: &ProviderDescriptor,
        text: &str,
    ) -> Result<Artifact, AttemptError> {
        let provider = descriptor.provider;
        let transport = self
            .transports
            .get(&provider)
            .ok_or(ProviderError::NotConfigured { provider })?;

        let payload = prompts::build_payload(task, provider, text, descriptor.input_limit);
        let raw = self.client.invoke(transport.as_ref(), &payload).await?;
        Ok(normalize::normalize(task, provider, &raw)?)
    }
}
