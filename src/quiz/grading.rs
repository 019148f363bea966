use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::Quiz;
use crate::error::AppResult;
use crate::scoring::{Scorer, PLAGIARISM_MIN_CHARS};
use crate::validate::char_len;

/// Answers (or reference answers) shorter than this are not worth a scorer
/// call and get a zero.
pub const GRADING_MIN_CHARS: usize = 10;

pub const TOO_SHORT_REASON: &str =
    "One or both texts were too short for a meaningful comparison.";

/// How per-question similarity scores turn into a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingMode {
    /// Similarity to the reference answer is the mark.
    Correctness,
    /// Similarity is a penalty; the mark is what remains of 100.
    Penalty,
}

impl GradingMode {
    fn mark(self, score: u8) -> f64 {
        match self {
            Self::Correctness => f64::from(score),
            Self::Penalty => f64::from(100 - score.min(100)),
        }
    }
}

impl FromStr for GradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "correctness" => Ok(Self::Correctness),
            "penalty" => Ok(Self::Penalty),
            other => Err(format!("unknown grading mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAnalysis {
    pub question: String,
    pub reference_answer: String,
    pub student_answer: String,
    pub score: u8,
    pub reason: String,
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub attempt_id: Uuid,
    pub final_mark: u8,
    pub mode: GradingMode,
    pub analysis: Vec<AnswerAnalysis>,
}

pub fn result_title(score: u8) -> &'static str {
    match score {
        90.. => "Excellent Work!",
        70..=89 => "Good Job!",
        50..=69 => "Room for Improvement",
        _ => "Needs Review",
    }
}

/// Mean of the per-question marks under `mode`, rounded. Zero for an
/// empty quiz.
pub fn aggregate(scores: &[u8], mode: GradingMode) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let total: f64 = scores.iter().map(|s| mode.mark(*s)).sum();
    (total / scores.len() as f64).round() as u8
}

fn pad(text: &str) -> String {
    let len = text.chars().count();
    if len >= PLAGIARISM_MIN_CHARS {
        return text.to_string();
    }
    let mut padded = String::with_capacity(text.len() + PLAGIARISM_MIN_CHARS - len);
    padded.push_str(text);
    padded.extend(std::iter::repeat(' ').take(PLAGIARISM_MIN_CHARS - len));
    padded
}

/// Grades a student's answers against the quiz, one scorer call per
/// question in order. `answers` is aligned with `quiz.questions`; missing
/// answers count as empty and extras are ignored. The first scorer error
/// fails the whole attempt.
pub async fn grade_attempt(
    scorer: &dyn Scorer,
    quiz: &Quiz,
    answers: &[String],
    mode: GradingMode,
) -> AppResult<GradeReport> {
    let attempt_id = Uuid::new_v4();
    info!(
        "Grading attempt {} ({} questions, {:?})",
        attempt_id,
        quiz.questions.len(),
        mode
    );

    let mut analysis = Vec::with_capacity(quiz.questions.len());
    for (index, question) in quiz.questions.iter().enumerate() {
        let student_answer = answers.get(index).map(String::as_str).unwrap_or("");
        let reference = question.answer.as_str();

        let (score, reason) = if char_len(student_answer) < GRADING_MIN_CHARS
            || char_len(reference) < GRADING_MIN_CHARS
        {
            debug!("Question {} answer too short, scoring 0", index + 1);
            (0, TOO_SHORT_REASON.to_string())
        } else {
            let result = scorer
                .score(&pad(student_answer.trim()), &pad(reference.trim()))
                .await?;
            (result.score, result.reason)
        };

        analysis.push(AnswerAnalysis {
            question: question.question.clone(),
            reference_answer: question.answer.clone(),
            student_answer: student_answer.to_string(),
            score,
            reason,
            title: result_title(score),
        });
    }

    let scores: Vec<u8> = analysis.iter().map(|a| a.score).collect();
    let final_mark = aggregate(&scores, mode);
    info!("Attempt {} final mark {}", attempt_id, final_mark);

    Ok(GradeReport {
        attempt_id,
        final_mark,
        mode,
        analysis,
    })
}
