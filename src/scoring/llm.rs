use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::{clamp_score, PlagiarismResult, Scorer, SimilarityBand};
use crate::agents::{parse_reply, prompts, LanguageModel};
use crate::error::{AppError, AppResult};

const NO_RESPONSE: &str = "Failed to get a response from the AI model.";

#[derive(Debug, Deserialize)]
struct ScoreReply {
    #[serde(rename = "plagiarismScore", alias = "score")]
    plagiarism_score: f64,
    reason: String,
}

/// Delegates scoring to the language model with the rubric prompt.
pub struct LlmScorer {
    model: Arc<dyn LanguageModel>,
}

impl LlmScorer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(&self, text1: &str, text2: &str) -> AppResult<PlagiarismResult> {
        let prompt = prompts::plagiarism_prompt(text1, text2);
        let reply = self
            .model
            .complete(prompts::PLAGIARISM_SYSTEM, &prompt)
            .await?;

        let parsed: ScoreReply = parse_reply(&reply).ok_or_else(|| {
            warn!("Plagiarism reply had no usable score ({} chars)", reply.len());
            AppError::Upstream(NO_RESPONSE.to_string())
        })?;

        let score = clamp_score(parsed.plagiarism_score);
        let reason = match parsed.reason.trim() {
            "" => SimilarityBand::from_score(score).label().to_string(),
            r => r.to_string(),
        };
        info!("Plagiarism score {}", score);

        Ok(PlagiarismResult { score, reason })
    }
}
