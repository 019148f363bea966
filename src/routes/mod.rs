mod api;
mod pages;

pub use api::*;
pub use pages::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::quiz::Quiz;
use crate::state::AppState;
use crate::storage::QuizCode;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/plagiarism-checker",
            get(plagiarism_page).post(plagiarism_submit),
        )
        .route("/teacher", get(teacher_page).post(teacher_generate))
        .route("/teacher/save", post(teacher_save))
        .route("/student", get(student_page))
        .route("/student/:code", get(student_quiz).post(student_submit))
        .route("/api/plagiarism", post(check_plagiarism))
        .route("/api/quiz", post(generate_quiz))
        .route("/api/quiz/save", post(save_quiz))
        .route("/api/quiz/:code", get(get_quiz))
        .route("/api/quiz/:code/submit", post(submit_quiz))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn quiz_not_found() -> AppError {
    AppError::NotFound("Quiz not found.".to_string())
}

/// Resolves a raw path segment to a saved quiz. Malformed codes are
/// reported the same way as unknown ones.
async fn load_quiz(state: &AppState, raw_code: &str) -> AppResult<(QuizCode, Quiz)> {
    let code: QuizCode = raw_code.parse().map_err(|_| quiz_not_found())?;
    let quiz = state.repo.load(&code).await?.ok_or_else(quiz_not_found)?;
    Ok((code, quiz))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{header, Method, Request, Response};
    use http_body_util::BodyExt;
    use std::sync::Arc;

    use crate::agents::testing::StubModel;
    use crate::quiz::{GradingMode, QuizGenerator};
    use crate::scoring::{EmbeddingScorer, HashingEmbedder};
    use crate::state::AppState;
    use crate::storage::MemoryQuizRepository;

    /// App wired with an in-memory repository, the embedding scorer and a
    /// stub model that answers generation prompts with `replies`.
    pub fn app_with(replies: Vec<String>) -> (axum::Router, Arc<AppState>) {
        let state = Arc::new(AppState {
            repo: Arc::new(MemoryQuizRepository::new()),
            scorer: Arc::new(EmbeddingScorer::new(HashingEmbedder::new(256))),
            generator: QuizGenerator::new(Arc::new(StubModel::with_replies(replies))),
            grading_mode: GradingMode::Correctness,
        });
        (super::router(state.clone()), state)
    }

    pub fn json_request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn encode(value: &str) -> String {
        value
            .bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{:02X}", b),
            })
            .collect()
    }

    pub async fn read_body(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn read_json(response: Response<Body>) -> serde_json::Value {
        serde_json::from_str(&read_body(response).await).unwrap()
    }
}
