//! Error types for the edgequake-doc2study library.
//!
//! Errors fall into two groups that are handled very differently:
//!
//! * **Recoverable generation errors**: [`ProviderError`], [`ParseError`]
//!   and [`GenerationError`]. A provider failing, or answering with something
//!   we cannot parse, only means "try the next provider". Even exhausting the
//!   whole chain is absorbed by [`crate::generate::Generator`], which falls
//!   back to local synthesis. None of these ever reach the end user.
//!
//! * **Fatal errors**: [`StudyError`]. The request cannot proceed at all:
//!   unsupported upload, nothing extractable, unknown document. These are
//!   returned from [`crate::service::StudyService`] and the CLI.

use crate::artifact::GenerationTask;
use crate::pipeline::transport::ProviderId;
use thiserror::Error;

/// A single provider call failed.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// No response within the per-attempt timeout.
    #[error("Provider '{provider}' timed out after {secs}s")]
    Timeout { provider: ProviderId, secs: u64 },

    /// Connection-level failure (DNS, TLS, reset, body read).
    #[error("Provider '{provider}' unreachable: {detail}")]
    Transport { provider: ProviderId, detail: String },

    /// Non-success HTTP status without a more specific marker.
    #[error("Provider '{provider}' returned HTTP {status}: {body}")]
    Http {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    /// The hosted model is still being loaded; worth waiting and retrying.
    #[error("Provider '{provider}' model is still loading: {message}")]
    ModelLoading { provider: ProviderId, message: String },

    /// The provider reported an error in its payload.
    #[error("Provider '{provider}' API error: {message}")]
    Api { provider: ProviderId, message: String },

    /// The provider is part of the route but has no credentials/transport.
    #[error("Provider '{provider}' is not configured")]
    NotConfigured { provider: ProviderId },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderId {
        match self {
            ProviderError::Timeout { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::Http { provider, .. }
            | ProviderError::ModelLoading { provider, .. }
            | ProviderError::Api { provider, .. }
            | ProviderError::NotConfigured { provider } => *provider,
        }
    }

    /// `true` for the transient "model loading" condition, which uses the
    /// longer backoff.
    pub fn is_loading(&self) -> bool {
        matches!(self, ProviderError::ModelLoading { .. })
    }
}

/// A provider answered, but not with anything usable for the task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The expected field is absent from every known response shape.
    #[error("Response has no '{field}' field")]
    MissingField { field: &'static str },

    /// Text that should have been JSON did not parse.
    #[error("Response is not valid JSON: {detail}")]
    InvalidJson { detail: String },

    /// JSON parsed but does not match the required structure.
    #[error("Response has an invalid shape: {detail}")]
    InvalidShape { detail: String },

    /// Well-formed but contained nothing for the task.
    #[error("Response produced no {task} content")]
    Empty { task: GenerationTask },
}

/// Why one entry of the provider chain was skipped.
#[derive(Debug, Clone, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A provider tried during one chain run and the reason it was passed over.
///
/// Ephemeral: exists only for the duration of one orchestrator call (and in
/// the [`crate::generate::GenerationOutcome`] handed back to the caller).
#[derive(Debug, Clone)]
pub struct ProviderAttempt {
    pub provider: ProviderId,
    pub error: AttemptError,
}

/// The provider chain could not produce an artifact.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Every provider configured for the task failed.
    #[error("All {} providers failed for task '{task}'", attempts.len())]
    AllProvidersExhausted {
        task: GenerationTask,
        attempts: Vec<ProviderAttempt>,
    },
}

/// All fatal errors returned by the edgequake-doc2study library.
#[derive(Debug, Clone, Error)]
pub enum StudyError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The uploaded file is neither PDF, DOCX nor plain text.
    #[error("Unsupported file type '{mime}' for '{filename}'. Please upload PDF or DOCX files only.")]
    UnsupportedFormat { mime: String, filename: String },

    /// The file type is supported but no text came out of it.
    #[error("Could not extract text from the document: {detail}")]
    ExtractionFailed { detail: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// No document with this id belongs to the caller.
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The storage backend rejected an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyError {
    /// Errors caused by the request itself (HTTP 4xx territory) rather than
    /// by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StudyError::UnsupportedFormat { .. }
                | StudyError::ExtractionFailed { .. }
                | StudyError::DocumentNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display_names_provider() {
        let e = ProviderError::Http {
            provider: ProviderId::HuggingFaceSummarizer,
            status: 503,
            body: "unavailable".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("huggingface-summarizer"), "got: {msg}");
        assert!(msg.contains("503"), "got: {msg}");
    }

    #[test]
    fn only_model_loading_is_loading() {
        let loading = ProviderError::ModelLoading {
            provider: ProviderId::HuggingFaceTextGeneration,
            message: "Model is currently loading".into(),
        };
        let timeout = ProviderError::Timeout {
            provider: ProviderId::ChatCompletion,
            secs: 30,
        };
        assert!(loading.is_loading());
        assert!(!timeout.is_loading());
        assert_eq!(timeout.provider(), ProviderId::ChatCompletion);
    }

    #[test]
    fn exhausted_display_counts_attempts() {
        let e = GenerationError::AllProvidersExhausted {
            task: GenerationTask::Quiz,
            attempts: vec![ProviderAttempt {
                provider: ProviderId::ChatCompletion,
                error: ParseError::Empty {
                    task: GenerationTask::Quiz,
                }
                .into(),
            }],
        };
        assert_eq!(e.to_string(), "All 1 providers failed for task 'quiz'");
    }

    #[test]
    fn client_errors_are_upload_and_lookup_failures() {
        assert!(StudyError::UnsupportedFormat {
            mime: "image/png".into(),
            filename: "a.png".into()
        }
        .is_client_error());
        assert!(StudyError::DocumentNotFound { id: "x".into() }.is_client_error());
        assert!(!StudyError::Internal("boom".into()).is_client_error());
    }
}
