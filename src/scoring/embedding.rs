use async_trait::async_trait;
use tracing::debug;

use super::similarity::{cosine_similarity, similarity_to_score};
use super::{clamp_score, PlagiarismResult, Scorer, SimilarityBand};
use crate::error::{AppError, AppResult};

/// Produces a fixed-dimension vector for a piece of text.
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Feature-hashing bag of words. Lower-cased alphanumeric tokens and
/// adjacent token pairs are hashed into `dim` signed buckets, then the
/// vector is scaled to unit length. Deterministic across runs and builds.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

const BIGRAM_WEIGHT: f32 = 0.5;

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn add(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dim as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut vector = vec![0.0f32; self.dim];
        for token in &tokens {
            self.add(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

/// Scores a pair by the cosine similarity of their embeddings.
pub struct EmbeddingScorer<E> {
    embedder: E,
}

impl<E: Embedder> EmbeddingScorer<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl<E: Embedder> Scorer for EmbeddingScorer<E> {
    async fn score(&self, text1: &str, text2: &str) -> AppResult<PlagiarismResult> {
        let a = self.embedder.embed(text1);
        let b = self.embedder.embed(text2);
        let dim = self.embedder.dimension();
        let similarity = cosine_similarity(&a, &b)
            .filter(|_| a.len() == dim)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Embedding length mismatch: {} and {}, expected {}",
                    a.len(),
                    b.len(),
                    dim
                ))
            })?;

        let score = clamp_score(similarity_to_score(similarity));
        debug!("Embedding similarity {:.3} -> score {}", similarity, score);

        Ok(PlagiarismResult {
            score,
            reason: format!(
                "{} (cosine similarity {:.2}).",
                SimilarityBand::from_score(score).label(),
                similarity
            ),
        })
    }
}
