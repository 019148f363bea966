//! Similarity scoring: turns two free-text inputs into a bounded plagiarism
//! score with a short reason.
//!
//! Two scorers implement [`Scorer`]. [`LlmScorer`] asks the language model
//! to grade the pair against the rubric bands in [`SimilarityBand`].
//! [`EmbeddingScorer`] embeds both texts locally, takes their cosine
//! similarity and remaps it onto the same 0-100 scale.

mod embedding;
mod llm;
pub mod similarity;

pub use embedding::{EmbeddingScorer, HashingEmbedder};
pub use llm::LlmScorer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AppResult;

/// Minimum length, in characters, of each text handed to a scorer.
pub const PLAGIARISM_MIN_CHARS: usize = 100;

/// Scores strictly above this are reported as plagiarism.
pub const PLAGIARISM_THRESHOLD: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlagiarismResult {
    pub score: u8,
    pub reason: String,
}

#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, text1: &str, text2: &str) -> AppResult<PlagiarismResult>;
}

/// Which scorer the application wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringStrategy {
    Llm,
    Embedding,
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "llm" => Ok(Self::Llm),
            "embedding" => Ok(Self::Embedding),
            other => Err(format!("unknown scoring strategy '{}'", other)),
        }
    }
}

/// Rubric bands the model is asked to score against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBand {
    NearExactCopy,
    Paraphrased,
    PartialOverlap,
    Original,
}

impl SimilarityBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::NearExactCopy,
            70..=89 => Self::Paraphrased,
            40..=69 => Self::PartialOverlap,
            _ => Self::Original,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NearExactCopy => "Exact / near exact copy",
            Self::Paraphrased => "Paraphrased but meaning is preserved",
            Self::PartialOverlap => "Partial overlap in meaning",
            Self::Original => "Mostly original / unrelated",
        }
    }
}

/// Verdict shown to someone running the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    High,
    Moderate,
    Low,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        if score > 75 {
            Self::High
        } else if score > PLAGIARISM_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::High => "High similarity detected. Strong indication of plagiarism.",
            Self::Moderate => "Moderate similarity detected. Potential plagiarism found.",
            Self::Low => "Low similarity detected. Unlikely to be plagiarized.",
        }
    }

    pub fn is_plagiarized(self) -> bool {
        !matches!(self, Self::Low)
    }
}

/// Rounds and clamps a raw score onto 0-100.
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}
