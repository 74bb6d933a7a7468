//! Document storage collaborator.
//!
//! Records are owned by a user; every lookup is scoped to the owner, so a
//! foreign id behaves exactly like a missing one.

use crate::artifact::{Flashcard, QuizQuestion};
use crate::error::StudyError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A stored document and its generated study material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizQuestion>,
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: title.into(),
            content: content.into(),
            summary: None,
            flashcards: Vec::new(),
            quiz: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn to_summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            title: self.title.clone(),
            summary: self.summary.clone(),
            created_at: self.created_at,
        }
    }
}

/// Listing entry: a record without its content or artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, record: DocumentRecord) -> Result<(), StudyError>;

    /// The record `id` if it belongs to `user_id`.
    async fn get(&self, user_id: &str, id: Uuid) -> Result<Option<DocumentRecord>, StudyError>;

    /// All of `user_id`'s documents, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<DocumentSummary>, StudyError>;

    /// Replace a stored record. Fails if it does not exist.
    async fn update(&self, record: DocumentRecord) -> Result<(), StudyError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<Uuid, DocumentRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, record: DocumentRecord) -> Result<(), StudyError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StudyError::Storage(format!(
                "document {} already exists",
                record.id
            )));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, user_id: &str, id: Uuid) -> Result<Option<DocumentRecord>, StudyError> {
        Ok(self
            .records
            .read()
            .await
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<DocumentSummary>, StudyError> {
        let records = self.records.read().await;
        let mut owned: Vec<&DocumentRecord> =
            records.values().filter(|r| r.user_id == user_id).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned.into_iter().map(DocumentRecord::to_summary).collect())
    }

    async fn update(&self, record: DocumentRecord) -> Result<(), StudyError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) if existing.user_id == record.user_id => {
                *existing = record;
                Ok(())
            }
            _ => Err(StudyError::DocumentNotFound {
                id: record.id.to_string(),
            }),
        }
    }
}
