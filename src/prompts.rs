//! Prompts and request payloads for every (task, provider) pair.
//!
//! All prompt text lives here so the chain, the client and the normaliser
//! never embed wording of their own. The normaliser's expectations (a
//! `Q:`/`A:` layout, a JSON array with `question`/`options`/`correctAnswer`)
//! are stated in these prompts; change both together.

use crate::artifact::GenerationTask;
use crate::pipeline::transport::{ProviderId, ProviderPayload};

/// System prompt for chat-completion summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates concise summaries of documents. Provide a clear, well-structured summary that captures the main points.";

/// System prompt for chat-completion flashcards.
pub const FLASHCARD_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates educational flashcards. Generate 5-10 flashcards based on the document content. Return them as a JSON array with 'question' and 'answer' fields.";

/// System prompt for chat-completion quizzes.
pub const QUIZ_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates multiple choice quizzes. Generate 5 multiple choice questions based on the document content. Return them as a JSON array with 'question', 'options' (array of 4 choices), and 'correctAnswer' (index 0-3) fields.";

/// Completion budget per task.
pub const SUMMARY_MAX_TOKENS: usize = 500;
pub const FLASHCARD_MAX_TOKENS: usize = 800;
pub const QUIZ_MAX_TOKENS: usize = 1000;

/// Keep at most `limit` characters of `text` (never splits a code point).
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Instruction for plain text-generation models, which have no system turn.
///
/// Asks for the `Q:`/`A:` line layout the normaliser scans for.
pub fn text_generation_flashcard_prompt(excerpt: &str) -> String {
    format!(
        "Create 5 educational flashcards from this text. Format as Q: question A: answer pairs:\n\n{}",
        excerpt
    )
}

/// Build the request payload for `task` on `provider`.
///
/// `input_limit` truncates the document before it is embedded; `None` sends
/// it whole.
pub fn build_payload(
    task: GenerationTask,
    provider: ProviderId,
    text: &str,
    input_limit: Option<usize>,
) -> ProviderPayload {
    let source = match input_limit {
        Some(limit) => truncate_chars(text, limit),
        None => text,
    };

    match provider {
        ProviderId::HuggingFaceSummarizer => ProviderPayload::Inputs(source.to_string()),
        ProviderId::HuggingFaceTextGeneration => match task {
            GenerationTask::Flashcards => {
                ProviderPayload::Inputs(text_generation_flashcard_prompt(source))
            }
            // Not on a default route; serves routes installed with
            // `ProviderChain::with_route`.
            GenerationTask::Summarize | GenerationTask::Quiz => {
                ProviderPayload::Inputs(chat_payload(task, source).as_inputs())
            }
        },
        ProviderId::ChatCompletion => chat_payload(task, source),
    }
}

fn chat_payload(task: GenerationTask, source: &str) -> ProviderPayload {
    let (system, user, max_tokens) = match task {
        GenerationTask::Summarize => (
            SUMMARY_SYSTEM_PROMPT,
            format!("Please summarize the following document:\n\n{}", source),
            SUMMARY_MAX_TOKENS,
        ),
        GenerationTask::Flashcards => (
            FLASHCARD_SYSTEM_PROMPT,
            format!("Create flashcards based on this document:\n\n{}", source),
            FLASHCARD_MAX_TOKENS,
        ),
        GenerationTask::Quiz => (
            QUIZ_SYSTEM_PROMPT,
            format!("Create a quiz based on this document:\n\n{}", source),
            QUIZ_MAX_TOKENS,
        ),
    };

    ProviderPayload::Chat {
        system: system.to_string(),
        user,
        max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn summarizer_payload_is_truncated_raw_text() {
        let text = "a".repeat(2000);
        let payload = build_payload(
            GenerationTask::Summarize,
            ProviderId::HuggingFaceSummarizer,
            &text,
            Some(1024),
        );
        assert_eq!(payload, ProviderPayload::Inputs("a".repeat(1024)));
    }

    #[test]
    fn text_generation_flashcards_use_qa_prompt() {
        let text = "b".repeat(900);
        match build_payload(
            GenerationTask::Flashcards,
            ProviderId::HuggingFaceTextGeneration,
            &text,
            Some(500),
        ) {
            ProviderPayload::Inputs(prompt) => {
                assert!(prompt.starts_with("Create 5 educational flashcards"));
                assert!(prompt.contains("Q: question A: answer"));
                assert!(prompt.ends_with(&"b".repeat(500)));
                assert!(!prompt.contains(&"b".repeat(501)));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn chat_quiz_payload_carries_system_prompt_and_budget() {
        match build_payload(GenerationTask::Quiz, ProviderId::ChatCompletion, "doc", None) {
            ProviderPayload::Chat {
                system,
                user,
                max_tokens,
            } => {
                assert_eq!(system, QUIZ_SYSTEM_PROMPT);
                assert!(user.ends_with("\n\ndoc"));
                assert_eq!(max_tokens, QUIZ_MAX_TOKENS);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn text_generation_quiz_flattens_chat_prompt() {
        let text = "c".repeat(900);
        match build_payload(
            GenerationTask::Quiz,
            ProviderId::HuggingFaceTextGeneration,
            &text,
            Some(500),
        ) {
            ProviderPayload::Inputs(prompt) => {
                assert!(prompt.starts_with(QUIZ_SYSTEM_PROMPT));
                assert!(prompt.contains("Create a quiz based on this document:"));
                assert!(prompt.ends_with(&"c".repeat(500)));
                assert!(!prompt.contains(&"c".repeat(501)));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
