//! End-to-end service flow: upload → extract → generate → store → read back.
//!
//! Runs fully offline: plain-text uploads and the local fallback generator.

use edgequake_doc2study::{
    Generator, InMemoryStore, PlainTextExtractor, StudyError, StudyService, Upload,
};
use std::sync::Arc;
use uuid::Uuid;

const NOTES: &str = "Photosynthesis converts light energy into chemical energy in plants. \
    Chlorophyll absorbs mostly blue and red wavelengths of visible light. \
    The Calvin cycle fixes carbon dioxide into three-carbon sugar molecules.";

fn service() -> StudyService {
    StudyService::new(
        Arc::new(Generator::offline()),
        Arc::new(PlainTextExtractor),
        Arc::new(InMemoryStore::new()),
    )
}

#[tokio::test]
async fn ingest_stores_document_with_summary() {
    let svc = service();
    let record = svc
        .ingest("alice", Upload::new("biology.txt", "text/plain", NOTES))
        .await
        .unwrap();

    assert_eq!(record.title, "biology.txt");
    assert_eq!(record.content, NOTES);
    assert!(record.summary.as_deref().is_some_and(|s| !s.is_empty()));
    assert!(record.flashcards.is_empty());

    let listed = svc.documents("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);
}

#[tokio::test]
async fn generated_material_is_persisted() {
    let svc = service();
    let record = svc
        .ingest("alice", Upload::new("notes.md", "", NOTES))
        .await
        .unwrap();

    let cards = svc.flashcards("alice", record.id).await.unwrap();
    assert_eq!(cards.len(), 3);
    assert_eq!(svc.stored_flashcards("alice", record.id).await.unwrap(), cards);

    let quiz = svc.quiz("alice", record.id).await.unwrap();
    assert!(!quiz.is_empty());
    assert!(quiz.iter().all(|q| q.correct_answer < 4));
    assert_eq!(svc.stored_quiz("alice", record.id).await.unwrap(), quiz);

    let again = svc.summarize("alice", record.id).await.unwrap();
    let stored = svc.document("alice", record.id).await.unwrap();
    assert_eq!(stored.summary.as_deref(), Some(again.as_str()));
    assert_eq!(stored.flashcards, cards);
}

#[tokio::test]
async fn upload_read_from_disk_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Lecture 3.txt");
    std::fs::write(&file, NOTES).unwrap();

    let bytes = tokio::fs::read(&file).await.unwrap();
    let svc = service();
    let record = svc
        .ingest("carol", Upload::new("Lecture 3.txt", "text/plain", bytes))
        .await
        .unwrap();
    assert_eq!(svc.document("carol", record.id).await.unwrap().content, NOTES);
}

#[tokio::test]
async fn unsupported_upload_is_rejected() {
    let err = service()
        .ingest("alice", Upload::new("photo.png", "image/png", vec![0u8; 8]))
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::UnsupportedFormat { .. }));
}

#[tokio::test]
async fn other_users_documents_are_not_found() {
    let svc = service();
    let record = svc
        .ingest("alice", Upload::new("notes.txt", "text/plain", NOTES))
        .await
        .unwrap();

    for result in [
        svc.document("bob", record.id).await.map(|_| ()),
        svc.flashcards("bob", record.id).await.map(|_| ()),
        svc.document("alice", Uuid::new_v4()).await.map(|_| ()),
    ] {
        assert!(matches!(result, Err(StudyError::DocumentNotFound { .. })));
    }
    assert!(svc.documents("bob").await.unwrap().is_empty());
}
