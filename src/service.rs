//! Study service: uploads in, study material out.
//!
//! Ties extraction, generation and storage together. Generation never fails
//! (see [`Generator`]); the only errors surfaced here come from the upload
//! itself, the extractor, or the store.

use crate::artifact::{Flashcard, GenerationTask, QuizQuestion};
use crate::error::StudyError;
use crate::extract::{title_from_filename, DocumentFormat, TextExtractor};
use crate::generate::{GenerationRequest, Generator};
use crate::store::{DocumentRecord, DocumentStore, DocumentSummary};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }
}

pub struct StudyService {
    generator: Arc<Generator>,
    extractor: Arc<dyn TextExtractor>,
    store: Arc<dyn DocumentStore>,
}

impl StudyService {
    pub fn new(
        generator: Arc<Generator>,
        extractor: Arc<dyn TextExtractor>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            generator,
            extractor,
            store,
        }
    }

    /// Extract, summarise and store an upload.
    pub async fn ingest(&self, user_id: &str, upload: Upload) -> Result<DocumentRecord, StudyError> {
        let format = DocumentFormat::detect(&upload.mime, &upload.filename)?;
        let content = self.extractor.extract(format, upload.bytes).await?;
        info!(
            "Extracted {} chars from '{}' ({:?})",
            content.chars().count(),
            upload.filename,
            format
        );

        let mut record = DocumentRecord::new(user_id, title_from_filename(&upload.filename), content);
        record.summary = self
            .generator
            .run(GenerationTask::Summarize, &record.content)
            .await
            .into_summary();

        self.store.insert(record.clone()).await?;
        info!("Stored document {} for user {}", record.id, user_id);
        Ok(record)
    }

    /// Regenerate and store the summary.
    pub async fn summarize(&self, user_id: &str, id: Uuid) -> Result<String, StudyError> {
        let mut record = self.load(user_id, id).await?;
        let summary = self
            .generator
            .run(GenerationTask::Summarize, &record.content)
            .await
            .into_summary()
            .unwrap_or_default();
        record.summary = Some(summary.clone());
        self.store.update(record).await?;
        Ok(summary)
    }

    /// Generate and store flashcards, replacing any previous set.
    pub async fn flashcards(&self, user_id: &str, id: Uuid) -> Result<Vec<Flashcard>, StudyError> {
        let mut record = self.load(user_id, id).await?;
        let cards = self
            .generator
            .generate(request_for(GenerationTask::Flashcards, &record))
            .await
            .artifact
            .into_flashcards()
            .unwrap_or_default();
        record.flashcards = cards.clone();
        self.store.update(record).await?;
        Ok(cards)
    }

    /// Generate and store a quiz, replacing any previous one.
    pub async fn quiz(&self, user_id: &str, id: Uuid) -> Result<Vec<QuizQuestion>, StudyError> {
        let mut record = self.load(user_id, id).await?;
        let quiz = self
            .generator
            .generate(request_for(GenerationTask::Quiz, &record))
            .await
            .artifact
            .into_quiz()
            .unwrap_or_default();
        record.quiz = quiz.clone();
        self.store.update(record).await?;
        Ok(quiz)
    }

    pub async fn documents(&self, user_id: &str) -> Result<Vec<DocumentSummary>, StudyError> {
        self.store.list(user_id).await
    }

    pub async fn document(&self, user_id: &str, id: Uuid) -> Result<DocumentRecord, StudyError> {
        self.load(user_id, id).await
    }

    pub async fn stored_flashcards(&self, user_id: &str, id: Uuid) -> Result<Vec<Flashcard>, StudyError> {
        Ok(self.load(user_id, id).await?.flashcards)
    }

    pub async fn stored_quiz(&self, user_id: &str, id: Uuid) -> Result<Vec<QuizQuestion>, StudyError> {
        Ok(self.load(user_id, id).await?.quiz)
    }

    async fn load(&self, user_id: &str, id: Uuid) -> Result<DocumentRecord, StudyError> {
        self.store
            .get(user_id, id)
            .await?
            .ok_or_else(|| StudyError::DocumentNotFound { id: id.to_string() })
    }
}

fn request_for(task: GenerationTask, record: &DocumentRecord) -> GenerationRequest {
    let request = GenerationRequest::new(task, record.content.clone());
    match record.summary {
        Some(ref summary) => request.with_summary(summary.clone()),
        None => request,
    }
}
