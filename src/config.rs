//! Configuration for the generation pipeline.
//!
//! Everything the pipeline reads from the outside world (API keys, endpoints,
//! model names, retry knobs, input limits) lives in one immutable
//! [`GenerationConfig`], built once at startup and injected into the
//! transports and the chain. Nothing below this module reads the environment.

use crate::error::StudyError;
use crate::pipeline::client::RetryPolicy;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default Hugging Face inference endpoint.
pub const DEFAULT_HUGGINGFACE_URL: &str = "https://api-inference.huggingface.co/models";
/// Default summarisation model.
pub const DEFAULT_SUMMARIZATION_MODEL: &str = "facebook/bart-large-cnn";
/// Default text-generation model.
pub const DEFAULT_TEXT_GENERATION_MODEL: &str = "microsoft/DialoGPT-medium";
/// Default chat-completion model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for generating study material.
///
/// Built via [`GenerationConfig::builder()`], [`GenerationConfig::from_env()`]
/// or [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2study::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .max_retries(2)
///     .request_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_retries, 2);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Hugging Face API token. The Hugging Face tiers are skipped without it.
    pub huggingface_api_key: Option<String>,

    /// Base URL; the model id is appended as a path. Default: [`DEFAULT_HUGGINGFACE_URL`].
    pub huggingface_base_url: String,

    /// Model used by the summarisation tier.
    pub summarization_model: String,

    /// Model used by the free-form text-generation tier.
    pub text_generation_model: String,

    /// Pre-constructed chat provider. Takes precedence over `chat_provider_name`.
    pub chat_provider: Option<Arc<dyn LLMProvider>>,

    /// Chat provider name for `edgequake_llm::ProviderFactory` (e.g. "openai").
    pub chat_provider_name: Option<String>,

    /// Chat model id. Default: [`DEFAULT_CHAT_MODEL`].
    pub chat_model: String,

    /// Sampling temperature for chat completions. Default: 0.3.
    pub temperature: f32,

    /// Per-attempt network timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Attempts per provider, including the first. Default: 3.
    pub max_retries: u32,

    /// Base backoff after a "model loading" reply, scaled by attempt. Default: 2000.
    pub loading_backoff_ms: u64,

    /// Base backoff after any other failure, scaled by attempt. Default: 1000.
    pub retry_backoff_ms: u64,

    /// Characters of source text sent for summarisation. Default: 1024.
    pub summary_input_limit: usize,

    /// Characters of source text embedded in flashcard and quiz prompts. Default: 500.
    pub prompt_input_limit: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            huggingface_api_key: None,
            huggingface_base_url: DEFAULT_HUGGINGFACE_URL.to_string(),
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.to_string(),
            text_generation_model: DEFAULT_TEXT_GENERATION_MODEL.to_string(),
            chat_provider: None,
            chat_provider_name: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: 0.3,
            request_timeout_secs: 30,
            max_retries: 3,
            loading_backoff_ms: 2000,
            retry_backoff_ms: 1000,
            summary_input_limit: 1024,
            prompt_input_limit: 500,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field(
                "huggingface_api_key",
                &self.huggingface_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("huggingface_base_url", &self.huggingface_base_url)
            .field("summarization_model", &self.summarization_model)
            .field("text_generation_model", &self.text_generation_model)
            .field(
                "chat_provider",
                &self.chat_provider.as_ref().map(|_| "<dyn LLMProvider>"),
            )
            .field("chat_provider_name", &self.chat_provider_name)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("summary_input_limit", &self.summary_input_limit)
            .field("prompt_input_limit", &self.prompt_input_limit)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read configuration from process environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `HUGGINGFACE_API_KEY` | `huggingface_api_key` |
    /// | `HUGGINGFACE_API_URL` | `huggingface_base_url` |
    /// | `DOC2STUDY_SUMMARY_MODEL` | `summarization_model` |
    /// | `DOC2STUDY_TEXTGEN_MODEL` | `text_generation_model` |
    /// | `DOC2STUDY_CHAT_PROVIDER` | `chat_provider_name` (`"openai"` if unset and `OPENAI_API_KEY` is) |
    /// | `DOC2STUDY_CHAT_MODEL` | `chat_model` |
    /// | `DOC2STUDY_TIMEOUT_SECS` | `request_timeout_secs` |
    /// | `DOC2STUDY_MAX_RETRIES` | `max_retries` |
    ///
    /// Unset or empty variables keep their defaults; unparsable numbers are
    /// an [`StudyError::InvalidConfig`].
    pub fn from_env() -> Result<Self, StudyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StudyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(key) = get("HUGGINGFACE_API_KEY") {
            builder = builder.huggingface_api_key(key);
        }
        if let Some(url) = get("HUGGINGFACE_API_URL") {
            builder = builder.huggingface_base_url(url);
        }
        if let Some(model) = get("DOC2STUDY_SUMMARY_MODEL") {
            builder = builder.summarization_model(model);
        }
        if let Some(model) = get("DOC2STUDY_TEXTGEN_MODEL") {
            builder = builder.text_generation_model(model);
        }
        // An OpenAI key alone is enough to enable the chat tier.
        if let Some(name) = get("DOC2STUDY_CHAT_PROVIDER") {
            builder = builder.chat_provider_name(name);
        } else if get("OPENAI_API_KEY").is_some() {
            builder = builder.chat_provider_name("openai");
        }
        if let Some(model) = get("DOC2STUDY_CHAT_MODEL") {
            builder = builder.chat_model(model);
        }
        if let Some(secs) = get("DOC2STUDY_TIMEOUT_SECS") {
            builder = builder.request_timeout_secs(parse_number("DOC2STUDY_TIMEOUT_SECS", &secs)?);
        }
        if let Some(n) = get("DOC2STUDY_MAX_RETRIES") {
            builder = builder.max_retries(parse_number("DOC2STUDY_MAX_RETRIES", &n)?);
        }

        builder.build()
    }

    /// Reopen a built configuration for further overrides.
    pub fn into_builder(self) -> GenerationConfigBuilder {
        GenerationConfigBuilder { config: self }
    }

    /// Retry policy handed to the provider client.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            loading_backoff_ms: self.loading_backoff_ms,
            retry_backoff_ms: self.retry_backoff_ms,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StudyError> {
    value
        .trim()
        .parse()
        .map_err(|_| StudyError::InvalidConfig(format!("{} must be a number, got '{}'", key, value)))
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn huggingface_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.huggingface_api_key = Some(key.into());
        self
    }

    pub fn huggingface_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.huggingface_base_url = url.into();
        self
    }

    pub fn summarization_model(mut self, model: impl Into<String>) -> Self {
        self.config.summarization_model = model.into();
        self
    }

    pub fn text_generation_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_generation_model = model.into();
        self
    }

    pub fn chat_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.chat_provider = Some(provider);
        self
    }

    pub fn chat_provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.chat_provider_name = Some(name.into());
        self
    }

    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.config.chat_model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn loading_backoff_ms(mut self, ms: u64) -> Self {
        self.config.loading_backoff_ms = ms;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn summary_input_limit(mut self, chars: usize) -> Self {
        self.config.summary_input_limit = chars;
        self
    }

    pub fn prompt_input_limit(mut self, chars: usize) -> Self {
        self.config.prompt_input_limit = chars;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, StudyError> {
        let c = &self.config;
        if c.max_retries == 0 {
            return Err(StudyError::InvalidConfig(
                "max_retries must be ≥ 1".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(StudyError::InvalidConfig(
                "request_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.summary_input_limit == 0 || c.prompt_input_limit == 0 {
            return Err(StudyError::InvalidConfig(
                "input limits must be ≥ 1 character".into(),
            ));
        }
        if !c.huggingface_base_url.starts_with("http://")
            && !c.huggingface_base_url.starts_with("https://")
        {
            return Err(StudyError::InvalidConfig(format!(
                "huggingface_base_url must be an HTTP(S) URL, got '{}'",
                c.huggingface_base_url
            )));
        }
        Ok(self.config)
    }
}
