/// Cosine similarity of two equal-length vectors. Returns 0 when either
/// vector has zero norm, and `None` when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    Some((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Maps a cosine similarity onto the 0-100 plagiarism scale. Piecewise
/// linear through (0, 0), (0.5, 20), (0.75, 50) and (0.95, 100); flat at
/// 100 above 0.95 and at 0 below 0.
pub fn similarity_to_score(similarity: f32) -> f64 {
    let s = f64::from(similarity);
    if similarity.is_nan() || similarity <= 0.0 {
        0.0
    } else if similarity >= 0.95 {
        100.0
    } else if similarity >= 0.75 {
        50.0 + (s - 0.75) / 0.20 * 50.0
    } else if similarity >= 0.5 {
        20.0 + (s - 0.5) / 0.25 * 30.0
    } else {
        s / 0.5 * 20.0
    }
}
