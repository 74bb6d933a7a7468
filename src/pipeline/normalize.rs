//! Response normalisation: provider-specific shapes → [`Artifact`].
//!
//! Providers answer in different shapes for the same task. Instead of
//! guessing at every call site, each `(task, provider)` pair maps to one
//! [`ParseStrategy`] in [`strategy_for`], and [`normalize`] applies it. Any
//! response that a strategy cannot turn into a non-empty artifact is rejected
//! here with a [`ParseError`], which the chain treats like a provider failure.
//!
//! ## Known shapes
//!
//! | Strategy | Accepts |
//! |----------|---------|
//! | `SummaryField` | `[{"summary_text": …}]`, `{"summary_text": …}` |
//! | `PlainSummary` | completion text |
//! | `GeneratedQaText` | `[{"generated_text": …}]`, `{"generated_text": …}` or text, scanned for `Q:`/`A:` lines |
//! | `JsonFlashcards` | JSON array of `{question, answer}` (optionally fenced / wrapped), else `Q:`/`A:` text |
//! | `JsonQuiz` | JSON array of `{question, options[4], correctAnswer}` (optionally fenced / wrapped) |

use crate::artifact::{Artifact, Flashcard, GenerationTask, QuizQuestion, QUIZ_OPTION_COUNT};
use crate::error::ParseError;
use crate::pipeline::transport::{ProviderId, RawResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// How a raw response is read for one `(task, provider)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    SummaryField,
    PlainSummary,
    GeneratedQaText,
    JsonFlashcards,
    JsonQuiz,
}

/// The parsing strategy table.
pub fn strategy_for(task: GenerationTask, provider: ProviderId) -> ParseStrategy {
    use GenerationTask as T;
    use ProviderId as P;

    match (task, provider) {
        (T::Summarize, P::HuggingFaceSummarizer) => ParseStrategy::SummaryField,
        (T::Summarize, _) => ParseStrategy::PlainSummary,
        (T::Flashcards, P::HuggingFaceTextGeneration) => ParseStrategy::GeneratedQaText,
        (T::Flashcards, _) => ParseStrategy::JsonFlashcards,
        (T::Quiz, _) => ParseStrategy::JsonQuiz,
    }
}

/// Turn `raw` into the artifact for `task`, or explain why it cannot.
pub fn normalize(
    task: GenerationTask,
    provider: ProviderId,
    raw: &RawResponse,
) -> Result<Artifact, ParseError> {
    match strategy_for(task, provider) {
        ParseStrategy::SummaryField => summary_field(raw).map(Artifact::Summary),
        ParseStrategy::PlainSummary => plain_summary(raw).map(Artifact::Summary),
        ParseStrategy::GeneratedQaText => generated_qa(raw).map(Artifact::Flashcards),
        ParseStrategy::JsonFlashcards => json_flashcards(raw).map(Artifact::Flashcards),
        ParseStrategy::JsonQuiz => json_quiz(raw).map(Artifact::Quiz),
    }
}

/// Scan text line by line for `Q:` / `A:` pairs.
///
/// An `A:` line closes the currently open question; a new `Q:` replaces an
/// unanswered one; every other line is ignored.
pub fn parse_qa_lines(text: &str) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    let mut open_question: Option<String> = None;

    for line in text.lines() {
        if let Some(q) = line.strip_prefix("Q:") {
            open_question = Some(q.trim().to_string());
        } else if let Some(a) = line.strip_prefix("A:") {
            // An empty question text counts as "no open question".
            if let Some(question) = open_question.take().filter(|q| !q.is_empty()) {
                cards.push(Flashcard::new(question, a.trim()));
            }
        }
    }

    cards
}

// ── Field lookup ─────────────────────────────────────────────────────────────

/// Read `field` from a list's first element or from the object itself.
fn lookup_text<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(0)
        .and_then(|first| first.get(field))
        .or_else(|| value.get(field))
        .and_then(Value::as_str)
}

fn non_empty(text: &str, task: GenerationTask) -> Result<String, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ParseError::Empty { task })
    } else {
        Ok(trimmed.to_string())
    }
}

// ── Summaries ────────────────────────────────────────────────────────────────

fn summary_field(raw: &RawResponse) -> Result<String, ParseError> {
    let value = match raw {
        RawResponse::Json(v) => v.clone(),
        RawResponse::Text(t) => serde_json::from_str(t).map_err(|_| ParseError::MissingField {
            field: "summary_text",
        })?,
    };
    let text = lookup_text(&value, "summary_text").ok_or(ParseError::MissingField {
        field: "summary_text",
    })?;
    non_empty(text, GenerationTask::Summarize)
}

fn plain_summary(raw: &RawResponse) -> Result<String, ParseError> {
    match raw {
        RawResponse::Text(t) => non_empty(t, GenerationTask::Summarize),
        RawResponse::Json(Value::String(s)) => non_empty(s, GenerationTask::Summarize),
        RawResponse::Json(_) => summary_field(raw),
    }
}

// ── Flashcards ───────────────────────────────────────────────────────────────

fn generated_qa(raw: &RawResponse) -> Result<Vec<Flashcard>, ParseError> {
    let text = match raw {
        RawResponse::Text(t) => t.as_str(),
        RawResponse::Json(v) => lookup_text(v, "generated_text").ok_or(ParseError::MissingField {
            field: "generated_text",
        })?,
    };
    require_cards(parse_qa_lines(text))
}

fn json_flashcards(raw: &RawResponse) -> Result<Vec<Flashcard>, ParseError> {
    let value = match raw {
        RawResponse::Json(v) => v.clone(),
        RawResponse::Text(t) => match parse_json_text(t) {
            Ok(v) => v,
            // Not JSON at all: the model may still have used the Q:/A: layout.
            Err(_) => return require_cards(parse_qa_lines(t)),
        },
    };

    let items = unwrap_list(&value, &["flashcards", "cards"])?;
    let cards = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let question = required_str(item, "question", i)?;
            let answer = required_str(item, "answer", i)?;
            Ok(Flashcard::new(question, answer))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    require_cards(cards)
}

fn require_cards(cards: Vec<Flashcard>) -> Result<Vec<Flashcard>, ParseError> {
    if cards.is_empty() {
        Err(ParseError::Empty {
            task: GenerationTask::Flashcards,
        })
    } else {
        Ok(cards)
    }
}

// ── Quiz ─────────────────────────────────────────────────────────────────────

fn json_quiz(raw: &RawResponse) -> Result<Vec<QuizQuestion>, ParseError> {
    let value = match raw {
        RawResponse::Json(v) => v.clone(),
        RawResponse::Text(t) => parse_json_text(t)?,
    };

    let items = unwrap_list(&value, &["quiz", "questions"])?;
    if items.is_empty() {
        return Err(ParseError::Empty {
            task: GenerationTask::Quiz,
        });
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| quiz_question(item, i))
        .collect()
}

fn quiz_question(item: &Value, index: usize) -> Result<QuizQuestion, ParseError> {
    let question = required_str(item, "question", index)?;

    let options = item
        .get("options")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::InvalidShape {
            detail: format!("question {} has no 'options' array", index),
        })?;
    if options.len() != QUIZ_OPTION_COUNT {
        return Err(ParseError::InvalidShape {
            detail: format!(
                "question {} has {} options, expected {}",
                index,
                options.len(),
                QUIZ_OPTION_COUNT
            ),
        });
    }
    let options: Vec<String> = options
        .iter()
        .map(|o| {
            o.as_str().map(str::to_string).ok_or_else(|| ParseError::InvalidShape {
                detail: format!("question {} has a non-string option", index),
            })
        })
        .collect::<Result<_, _>>()?;
    let options: [String; QUIZ_OPTION_COUNT] =
        options.try_into().map_err(|_| ParseError::InvalidShape {
            detail: format!("question {} options could not be fixed to {}", index, QUIZ_OPTION_COUNT),
        })?;

    let correct = item
        .get("correctAnswer")
        .and_then(Value::as_u64)
        .ok_or_else(|| ParseError::InvalidShape {
            detail: format!("question {} has no integer 'correctAnswer'", index),
        })?;
    let correct = u8::try_from(correct).map_err(|_| ParseError::InvalidShape {
        detail: format!("question {} correctAnswer {} out of range", index, correct),
    })?;

    QuizQuestion::new(question, options, correct)
}

// ── JSON helpers ─────────────────────────────────────────────────────────────

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```\s*$").unwrap());

/// Remove a single outer ```json fence, if present.
pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_JSON_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

fn parse_json_text(text: &str) -> Result<Value, ParseError> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| ParseError::InvalidJson {
        detail: e.to_string(),
    })
}

/// Accept a bare array, or an object wrapping one under a known key.
fn unwrap_list<'a>(value: &'a Value, keys: &[&str]) -> Result<&'a Vec<Value>, ParseError> {
    if let Some(items) = value.as_array() {
        return Ok(items);
    }
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_array))
        .ok_or_else(|| ParseError::InvalidShape {
            detail: "expected a JSON array".to_string(),
        })
}

fn required_str(item: &Value, field: &'static str, index: usize) -> Result<String, ParseError> {
    match item.get(field).and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ParseError::InvalidShape {
            detail: format!("item {} has no non-empty string '{}'", index, field),
        }),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
