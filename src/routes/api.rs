use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::load_quiz;
use crate::error::{AppError, AppResult};
use crate::quiz::{grade_attempt, GenerateQuizRequest, GradeReport, Quiz};
use crate::scoring::{SimilarityBand, Verdict};
use crate::state::AppState;
use crate::storage::QuizCode;
use crate::validate;

#[derive(Debug, Deserialize)]
pub struct PlagiarismRequest {
    pub text1: String,
    pub text2: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlagiarismResponse {
    pub score: u8,
    pub reason: String,
    pub verdict: Verdict,
    pub message: &'static str,
    pub band: SimilarityBand,
    pub is_plagiarized: bool,
}

impl PlagiarismResponse {
    pub fn new(score: u8, reason: String) -> Self {
        let verdict = Verdict::from_score(score);
        Self {
            score,
            reason,
            verdict,
            message: verdict.message(),
            band: SimilarityBand::from_score(score),
            is_plagiarized: verdict.is_plagiarized(),
        }
    }
}

pub async fn check_plagiarism(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlagiarismRequest>,
) -> AppResult<Json<PlagiarismResponse>> {
    validate::plagiarism_texts(&req.text1, &req.text2)?;
    let result = state.scorer.score(&req.text1, &req.text2).await?;
    Ok(Json(PlagiarismResponse::new(result.score, result.reason)))
}

pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateQuizRequest>,
) -> AppResult<Json<Quiz>> {
    let quiz = state.generator.generate(&req).await?;
    Ok(Json(quiz))
}

#[derive(Debug, Serialize)]
pub struct SavedQuiz {
    pub code: QuizCode,
}

pub async fn save_quiz(
    State(state): State<Arc<AppState>>,
    Json(quiz): Json<Quiz>,
) -> AppResult<(StatusCode, Json<SavedQuiz>)> {
    if quiz.questions.is_empty() {
        return Err(AppError::validation(
            "questions",
            "A quiz needs at least one question.",
        ));
    }
    let code = state.repo.save(&quiz).await?;
    Ok((StatusCode::CREATED, Json(SavedQuiz { code })))
}

pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<Json<Quiz>> {
    let (_, quiz) = load_quiz(&state, &code).await?;
    Ok(Json(quiz))
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub answers: Vec<String>,
}

pub async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(req): Json<SubmissionRequest>,
) -> AppResult<Json<GradeReport>> {
    let (_, quiz) = load_quiz(&state, &code).await?;
    let report = grade_attempt(
        state.scorer.as_ref(),
        &quiz,
        &req.answers,
        state.grading_mode,
    )
    .await?;
    Ok(Json(report))
}
