//! Local fallback generator: provider-free synthesis from the document text.
//!
//! Used when every provider for a task has failed. The output is crude but
//! always non-empty and a pure function of its input, so the same document
//! always degrades to the same artifact.
//!
//! All lengths are measured in characters, not bytes.

use crate::artifact::{Artifact, Flashcard, GenerationTask, QuizQuestion};
use once_cell::sync::Lazy;
use regex::Regex;

/// Summary sentences must be longer than this.
const SUMMARY_SENTENCE_MIN: usize = 20;
/// Sentences joined into a summary.
const SUMMARY_SENTENCES: usize = 3;
/// A joined summary shorter than this is replaced by a description.
const SUMMARY_MIN_LEN: usize = 50;
/// Excerpt length in the synthesised description.
const SUMMARY_EXCERPT_LEN: usize = 200;

const FLASHCARD_SENTENCE_MIN: usize = 30;
const FLASHCARD_LIMIT: usize = 5;
const FLASHCARD_PLACEHOLDER: &str = "This document contains important information.";

const QUIZ_SENTENCE_MIN: usize = 50;
const QUIZ_LIMIT: usize = 5;
const QUIZ_KEYWORD_MIN: usize = 5;
const QUIZ_OPTION_EXCERPT_LEN: usize = 80;

static RE_SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Synthesise the artifact for `task`.
///
/// `summary` is a previously stored summary; only the flashcard path uses it,
/// for the single generic card emitted when no sentence qualifies.
pub fn generate(task: GenerationTask, text: &str, summary: Option<&str>) -> Artifact {
    match task {
        GenerationTask::Summarize => Artifact::Summary(summary_for(text)),
        GenerationTask::Flashcards => Artifact::Flashcards(flashcards_for(text, summary)),
        GenerationTask::Quiz => Artifact::Quiz(quiz_for(text)),
    }
}

/// Split on runs of `.`, `!` and `?`. Pieces are returned untrimmed.
pub fn split_sentences(text: &str) -> Vec<&str> {
    RE_SENTENCE_BREAK.split(text).collect()
}

/// Sentences whose trimmed length exceeds `min_len`, untrimmed, in order.
fn sentences_longer_than(text: &str, min_len: usize) -> impl Iterator<Item = &str> {
    split_sentences(text)
        .into_iter()
        .filter(move |s| char_len(s.trim()) > min_len)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn prefix_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// First three substantial sentences, or a length-plus-excerpt description
/// when they add up to too little.
pub fn summary_for(text: &str) -> String {
    let picked: Vec<&str> = sentences_longer_than(text, SUMMARY_SENTENCE_MIN)
        .take(SUMMARY_SENTENCES)
        .collect();
    let joined = format!("{}.", picked.join(". "));

    if char_len(&joined) < SUMMARY_MIN_LEN {
        format!(
            "This document contains {} characters of text. Key content includes: {}...",
            char_len(text),
            prefix_chars(text, SUMMARY_EXCERPT_LEN)
        )
    } else {
        joined
    }
}

/// One card per substantial sentence (up to five), or a single generic card.
pub fn flashcards_for(text: &str, summary: Option<&str>) -> Vec<Flashcard> {
    let cards: Vec<Flashcard> = sentences_longer_than(text, FLASHCARD_SENTENCE_MIN)
        .take(FLASHCARD_LIMIT)
        .enumerate()
        .map(|(i, sentence)| {
            Flashcard::new(
                format!("What does the document say about topic {}?", i + 1),
                sentence.trim(),
            )
        })
        .collect();

    if !cards.is_empty() {
        return cards;
    }

    let answer = summary
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FLASHCARD_PLACEHOLDER);
    vec![Flashcard::new("What is the main topic of this document?", answer)]
}

/// One recall question per long sentence (up to five), or two generic ones.
pub fn quiz_for(text: &str) -> Vec<QuizQuestion> {
    let questions: Vec<QuizQuestion> = sentences_longer_than(text, QUIZ_SENTENCE_MIN)
        .take(QUIZ_LIMIT)
        .map(|sentence| sentence_question(sentence.trim()))
        .collect();

    if questions.is_empty() {
        generic_quiz(text)
    } else {
        questions
    }
}

/// First word longer than five characters, else the positional middle word.
pub fn key_word(sentence: &str) -> &str {
    let words: Vec<&str> = sentence.split(' ').collect();
    words
        .iter()
        .copied()
        .find(|w| char_len(w) > QUIZ_KEYWORD_MIN)
        .unwrap_or(words[words.len() / 2])
}

fn sentence_question(sentence: &str) -> QuizQuestion {
    QuizQuestion {
        question: format!(
            "According to the document, what is mentioned about \"{}\"?",
            key_word(sentence)
        ),
        options: [
            format!("{}...", prefix_chars(sentence, QUIZ_OPTION_EXCERPT_LEN)),
            "This is not mentioned in the document".to_string(),
            "The document discusses something else entirely".to_string(),
            "This information is not available".to_string(),
        ],
        correct_answer: 0,
    }
}

fn generic_quiz(text: &str) -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            question: "What type of document is this?".to_string(),
            options: [
                "Text document".to_string(),
                "Image file".to_string(),
                "Video file".to_string(),
                "Audio file".to_string(),
            ],
            correct_answer: 0,
        },
        QuizQuestion {
            question: "How many characters does this document contain approximately?".to_string(),
            options: [
                format!("About {} characters", char_len(text)),
                "Less than 100 characters".to_string(),
                "More than 1 million characters".to_string(),
                "Exactly 500 characters".to_string(),
            ],
            correct_answer: 0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_fragments_untrimmed() {
        assert_eq!(split_sentences("A. B!? C"), vec!["A", " B", " C"]);
        assert_eq!(split_sentences("end."), vec!["end", ""]);
    }

    #[test]
    fn summary_joins_first_three_long_sentences() {
        let text = "The first sentence is quite long. Short. The second sentence is also long! \
                    The third sentence keeps going? The fourth one is ignored entirely.";
        assert_eq!(
            summary_for(text),
            "The first sentence is quite long.  The second sentence is also long.  \
             The third sentence keeps going."
        );
    }

    #[test]
    fn summary_of_single_short_sentence_is_synthesised() {
        let text = "This sentence has 25 char.";
        assert_eq!(char_len(text.trim_end_matches('.')), 25);
        let summary = summary_for(text);
        assert_eq!(
            summary,
            "This document contains 26 characters of text. \
             Key content includes: This sentence has 25 char...."
        );
    }

    #[test]
    fn summary_excerpt_is_capped_at_200_chars() {
        let text = "ab. ".repeat(200);
        let summary = summary_for(&text);
        assert!(summary.starts_with("This document contains 800 characters"));
        assert!(summary.ends_with(&format!("{}...", prefix_chars(&text, 200))));
    }

    #[test]
    fn summary_of_empty_text_is_not_empty() {
        assert_eq!(
            summary_for(""),
            "This document contains 0 characters of text. Key content includes: ..."
        );
    }

    #[test]
    fn flashcards_number_topics_and_trim_answers() {
        let text = "  Rust guarantees memory safety without a garbage collector.  \
                    Tiny. Ownership rules are checked entirely at compile time.";
        let cards = flashcards_for(text, None);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].question, "What does the document say about topic 1?");
        assert_eq!(
            cards[0].answer,
            "Rust guarantees memory safety without a garbage collector"
        );
        assert_eq!(cards[1].question, "What does the document say about topic 2?");
    }

    #[test]
    fn flashcards_cap_at_five() {
        let text = "This sentence is definitely longer than thirty chars. ".repeat(8);
        assert_eq!(flashcards_for(&text, None).len(), 5);
    }

    #[test]
    fn flashcards_without_sentences_use_summary_or_placeholder() {
        let with = flashcards_for("short.", Some("Stored summary"));
        assert_eq!(
            with,
            vec![Flashcard::new(
                "What is the main topic of this document?",
                "Stored summary"
            )]
        );
        let without = flashcards_for("short.", None);
        assert_eq!(without[0].answer, FLASHCARD_PLACEHOLDER);
        let blank = flashcards_for("short.", Some("   "));
        assert_eq!(blank[0].answer, FLASHCARD_PLACEHOLDER);
    }

    #[test]
    fn key_word_prefers_first_long_word() {
        assert_eq!(key_word("The quickest brown fox"), "quickest");
        assert_eq!(key_word("An ownership model"), "ownership");
        // No word longer than five characters: middle word by position.
        assert_eq!(key_word("a bb ccc dd e"), "ccc");
        assert_eq!(key_word("one two"), "two");
    }

    #[test]
    fn quiz_questions_point_at_sentence_excerpt() {
        let sentence = "Photosynthesis converts light energy into chemical energy stored in glucose molecules";
        let quiz = quiz_for(&format!("{}.", sentence));
        assert_eq!(quiz.len(), 1);
        let q = &quiz[0];
        assert_eq!(
            q.question,
            "According to the document, what is mentioned about \"Photosynthesis\"?"
        );
        assert_eq!(q.options[0], format!("{}...", prefix_chars(sentence, 80)));
        assert_eq!(q.options[1], "This is not mentioned in the document");
        assert_eq!(q.correct_answer, 0);
    }

    #[test]
    fn quiz_without_long_sentences_is_two_generic_questions() {
        let text = "Too short. Also short!";
        let quiz = quiz_for(text);
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz[0].question, "What type of document is this?");
        assert_eq!(quiz[0].correct_option(), "Text document");
        assert_eq!(quiz[1].correct_option(), "About 22 characters");
        assert!(quiz.iter().all(|q| q.correct_answer == 0));
    }

    #[test]
    fn generation_is_deterministic() {
        let text = "Deterministic output matters for caching and for tests. \
                    Running twice must give the same artifact every single time.";
        for task in GenerationTask::ALL {
            assert_eq!(generate(task, text, None), generate(task, text, None));
        }
    }
}
