//! # edgequake-doc2study
//!
//! Turn uploaded documents into study material: a summary, flashcards and a
//! multiple-choice quiz.
//!
//! Generation goes through an ordered chain of AI providers (Hugging Face
//! inference models, then a chat-completion model via `edgequake-llm`). Each
//! provider is retried with attempt-scaled backoff; any failure moves on to
//! the next provider. When the whole chain is exhausted a deterministic local
//! generator builds the artifact from the text itself, so generation never
//! fails.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Extract   PDF (pdfium) / plain text → String
//!  ├─ 2. Chain     HF summariser / HF text-gen / chat, in task order
//!  ├─ 3. Retry     ≤3 attempts per provider, 2s×n if loading else 1s×n
//!  ├─ 4. Normalise provider reply → Summary | Flashcards | Quiz
//!  ├─ 5. Fallback  local synthesis when every provider failed
//!  └─ 6. Store     DocumentRecord per user
//! ```
//!
//! | Task | Provider order |
//! |------|----------------|
//! | summarize  | `facebook/bart-large-cnn` → chat |
//! | flashcards | `microsoft/DialoGPT-medium` → chat |
//! | quiz       | chat |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2study::{GenerationConfig, GenerationTask, Generator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // HUGGINGFACE_API_KEY / OPENAI_API_KEY enable the provider tiers.
//!     let config = GenerationConfig::from_env()?;
//!     let generator = Generator::from_config(&config)?;
//!     let quiz = generator.run(GenerationTask::Quiz, "Document text …").await;
//!     println!("{}", serde_json::to_string_pretty(&quiz)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2study` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod config;
pub mod error;
pub mod extract;
pub mod generate;
pub mod pipeline;
pub mod prompts;
pub mod service;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{Artifact, ArtifactOrigin, Flashcard, GenerationTask, QuizQuestion};
pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use error::{
    AttemptError, GenerationError, ParseError, ProviderAttempt, ProviderError, StudyError,
};
pub use extract::{DocumentFormat, PdfiumExtractor, PlainTextExtractor, TextExtractor};
pub use generate::{GenerationOutcome, GenerationRequest, Generator};
pub use pipeline::chain::ProviderChain;
pub use pipeline::client::{ProviderClient, RetryPolicy};
pub use pipeline::transport::{ProviderId, ProviderPayload, ProviderTransport, RawResponse};
pub use service::{StudyService, Upload};
pub use store::{DocumentRecord, DocumentStore, DocumentSummary, InMemoryStore};
