//! Input rules for the checker and quiz forms. Each check reports the first
//! failing field so the caller can point at it.

use crate::error::{AppError, AppResult};
use crate::scoring::PLAGIARISM_MIN_CHARS;

pub const TOPIC_MIN_CHARS: usize = 3;
pub const CONTENT_MIN_CHARS: usize = 200;
pub const MIN_QUESTIONS: i64 = 1;
pub const MAX_QUESTIONS: i64 = 10;

/// Length in characters, ignoring surrounding whitespace.
pub fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

pub fn plagiarism_texts(text1: &str, text2: &str) -> AppResult<()> {
    min_chars("text1", "Original text", text1, PLAGIARISM_MIN_CHARS)?;
    min_chars("text2", "Comparison text", text2, PLAGIARISM_MIN_CHARS)
}

/// Validates a quiz generation request and returns the question count
/// narrowed to its allowed range.
pub fn quiz_request(topic: &str, content: &str, question_count: i64) -> AppResult<u8> {
    min_chars("topic", "Topic", topic, TOPIC_MIN_CHARS)?;
    min_chars("content", "Content", content, CONTENT_MIN_CHARS)?;

    if question_count < MIN_QUESTIONS {
        return Err(AppError::validation(
            "questionCount",
            "Must have at least 1 question.",
        ));
    }
    if question_count > MAX_QUESTIONS {
        return Err(AppError::validation(
            "questionCount",
            "Cannot have more than 10 questions.",
        ));
    }
    Ok(question_count as u8)
}

fn min_chars(field: &'static str, label: &str, value: &str, min: usize) -> AppResult<()> {
    if char_len(value) < min {
        return Err(AppError::validation(
            field,
            format!("{} must be at least {} characters long.", label, min),
        ));
    }
    Ok(())
}
