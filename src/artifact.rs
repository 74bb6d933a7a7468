//! Generation tasks and the artifacts they produce.
//!
//! An [`Artifact`] is the single result type of every generation path: the
//! provider chain normalises raw responses into one, and the local fallback
//! synthesises one directly from the document text. Keeping both paths on the
//! same tagged union means callers never care which path produced it.

use crate::error::ParseError;
use crate::pipeline::transport::ProviderId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three things we can generate from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationTask {
    /// Concise prose summary.
    Summarize,
    /// Question/answer study cards.
    Flashcards,
    /// Four-option multiple-choice questions.
    Quiz,
}

impl GenerationTask {
    /// Every task, in the order a full run produces them.
    pub const ALL: [GenerationTask; 3] = [
        GenerationTask::Summarize,
        GenerationTask::Flashcards,
        GenerationTask::Quiz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationTask::Summarize => "summarize",
            GenerationTask::Flashcards => "flashcards",
            GenerationTask::Quiz => "quiz",
        }
    }
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One study card. Order within a deck is presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Number of options every quiz question carries.
pub const QUIZ_OPTION_COUNT: usize = 4;

/// A multiple-choice question with exactly four options.
///
/// The option count is enforced by the array type; `correct_answer` is
/// validated by [`QuizQuestion::new`] and always indexes `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: [String; QUIZ_OPTION_COUNT],
    pub correct_answer: u8,
}

impl QuizQuestion {
    /// Build a question, rejecting an out-of-range answer index.
    pub fn new(
        question: impl Into<String>,
        options: [String; QUIZ_OPTION_COUNT],
        correct_answer: u8,
    ) -> Result<Self, ParseError> {
        if usize::from(correct_answer) >= QUIZ_OPTION_COUNT {
            return Err(ParseError::InvalidShape {
                detail: format!(
                    "correctAnswer must be in 0..{}, got {}",
                    QUIZ_OPTION_COUNT, correct_answer
                ),
            });
        }
        Ok(Self {
            question: question.into(),
            options,
            correct_answer,
        })
    }

    /// The option text marked as correct.
    pub fn correct_option(&self) -> &str {
        &self.options[usize::from(self.correct_answer)]
    }
}

/// Structured output of one generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Artifact {
    Summary(String),
    Flashcards(Vec<Flashcard>),
    Quiz(Vec<QuizQuestion>),
}

impl Artifact {
    /// The task this artifact answers.
    pub fn task(&self) -> GenerationTask {
        match self {
            Artifact::Summary(_) => GenerationTask::Summarize,
            Artifact::Flashcards(_) => GenerationTask::Flashcards,
            Artifact::Quiz(_) => GenerationTask::Quiz,
        }
    }

    /// Number of elements (characters for a summary).
    pub fn len(&self) -> usize {
        match self {
            Artifact::Summary(s) => s.chars().count(),
            Artifact::Flashcards(cards) => cards.len(),
            Artifact::Quiz(questions) => questions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Artifact::Summary(s) => s.trim().is_empty(),
            Artifact::Flashcards(cards) => cards.is_empty(),
            Artifact::Quiz(questions) => questions.is_empty(),
        }
    }

    pub fn as_summary(&self) -> Option<&str> {
        match self {
            Artifact::Summary(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_summary(self) -> Option<String> {
        match self {
            Artifact::Summary(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_flashcards(self) -> Option<Vec<Flashcard>> {
        match self {
            Artifact::Flashcards(cards) => Some(cards),
            _ => None,
        }
    }

    pub fn into_quiz(self) -> Option<Vec<QuizQuestion>> {
        match self {
            Artifact::Quiz(questions) => Some(questions),
            _ => None,
        }
    }
}

/// Where an artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactOrigin {
    /// A provider answered and its response normalised cleanly.
    Provider(ProviderId),
    /// Every provider failed; the local generator synthesised it.
    Fallback,
}

impl ArtifactOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ArtifactOrigin::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; 4] {
        ["a".into(), "b".into(), "c".into(), "d".into()]
    }

    #[test]
    fn quiz_question_rejects_out_of_range_answer() {
        assert!(QuizQuestion::new("q", options(), 3).is_ok());
        let err = QuizQuestion::new("q", options(), 4).unwrap_err();
        assert!(err.to_string().contains("correctAnswer"), "got: {err}");
    }

    #[test]
    fn quiz_question_serialises_camel_case() {
        let q = QuizQuestion::new("q", options(), 2).unwrap();
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["correctAnswer"], 2);
        assert_eq!(json["options"].as_array().unwrap().len(), 4);
        assert_eq!(q.correct_option(), "c");
    }

    #[test]
    fn artifact_reports_task_and_emptiness() {
        assert_eq!(
            Artifact::Summary("x".into()).task(),
            GenerationTask::Summarize
        );
        assert!(Artifact::Summary("   ".into()).is_empty());
        assert!(Artifact::Flashcards(vec![]).is_empty());
        assert_eq!(
            Artifact::Flashcards(vec![Flashcard::new("q", "a")]).len(),
            1
        );
    }

    #[test]
    fn task_display_matches_serde_name() {
        for task in GenerationTask::ALL {
            let json = serde_json::to_string(&task).unwrap();
            assert_eq!(json, format!("\"{}\"", task));
        }
    }
}
