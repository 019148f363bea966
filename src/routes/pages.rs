use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tera::Context;

use super::{load_quiz, quiz_not_found, PlagiarismResponse};
use crate::error::{AppError, AppResult};
use crate::quiz::{grade_attempt, GenerateQuizRequest, Quiz};
use crate::state::AppState;
use crate::storage::QuizCode;
use crate::validate;

/// Where the quiz workflow is. Templates switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Teacher is filling in the generation form.
    Authoring,
    /// A quiz is on screen, either for the teacher to check and share or
    /// for a student to answer.
    Reviewing,
    /// A graded attempt is on screen.
    Grading,
}

fn render(name: &str, view: Option<ViewState>, mut ctx: Context) -> Html<String> {
    if let Some(view) = view {
        ctx.insert("view", &view);
    }
    let tera = crate::templates::get_tera();
    let rendered = tera.render(name, &ctx).unwrap_or_else(|e| {
        tracing::error!("Failed to render {}: {:?}", name, e);
        format!("Template error: {}", name)
    });
    Html(rendered)
}

/// Renders `name` with the error shown inline and the error's status code.
fn render_error(name: &str, view: Option<ViewState>, mut ctx: Context, err: &AppError) -> Response {
    ctx.insert("error", &err.to_string());
    if let Some(field) = err.field() {
        ctx.insert("error_field", field);
    }
    (err.status(), render(name, view, ctx)).into_response()
}

pub async fn index() -> impl IntoResponse {
    render("index.html", None, Context::new())
}

pub async fn plagiarism_page() -> impl IntoResponse {
    render("plagiarism.html", None, Context::new())
}

#[derive(Debug, Deserialize)]
pub struct PlagiarismForm {
    text1: String,
    text2: String,
}

pub async fn plagiarism_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PlagiarismForm>,
) -> Response {
    let mut ctx = Context::new();
    ctx.insert("text1", &form.text1);
    ctx.insert("text2", &form.text2);

    let outcome = match validate::plagiarism_texts(&form.text1, &form.text2) {
        Ok(()) => state.scorer.score(&form.text1, &form.text2).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => {
            ctx.insert("result", &PlagiarismResponse::new(result.score, result.reason));
            render("plagiarism.html", None, ctx).into_response()
        }
        Err(e) => render_error("plagiarism.html", None, ctx, &e),
    }
}

pub async fn teacher_page() -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("question_count", &3);
    render("teacher.html", Some(ViewState::Authoring), ctx)
}

/// The authoring form. The count arrives as free text so a bad value can be
/// shown inline next to the field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherForm {
    topic: String,
    content: String,
    #[serde(default)]
    question_count: String,
}

impl TeacherForm {
    fn into_request(self) -> AppResult<GenerateQuizRequest> {
        let question_count = self.question_count.trim().parse::<i64>().map_err(|_| {
            AppError::validation("questionCount", "Number of questions must be a whole number.")
        })?;
        Ok(GenerateQuizRequest {
            topic: self.topic,
            content: self.content,
            question_count,
        })
    }
}

pub async fn teacher_generate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TeacherForm>,
) -> Response {
    let mut ctx = Context::new();
    ctx.insert("topic", &form.topic);
    ctx.insert("content", &form.content);
    ctx.insert("question_count", form.question_count.trim());

    let outcome = match form.into_request() {
        Ok(request) => state.generator.generate(&request).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(quiz) => review_quiz(ctx, &quiz).into_response(),
        Err(e) => render_error("teacher.html", Some(ViewState::Authoring), ctx, &e),
    }
}

fn review_quiz(mut ctx: Context, quiz: &Quiz) -> Html<String> {
    // Round-tripped through a hidden field so the save step needs no session.
    let quiz_json = serde_json::to_string(quiz).unwrap_or_default();
    ctx.insert("quiz", quiz);
    ctx.insert("quiz_json", &quiz_json);
    render("teacher.html", Some(ViewState::Reviewing), ctx)
}

#[derive(Debug, Deserialize)]
pub struct SaveForm {
    quiz: String,
}

pub async fn teacher_save(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SaveForm>,
) -> Response {
    let quiz: Quiz = match serde_json::from_str(&form.quiz) {
        Ok(quiz) => quiz,
        Err(_) => {
            let err = AppError::validation("quiz", "The quiz could not be read. Generate it again.");
            return render_error("teacher.html", Some(ViewState::Authoring), Context::new(), &err);
        }
    };

    match state.repo.save(&quiz).await {
        Ok(code) => {
            let mut ctx = Context::new();
            ctx.insert("code", code.as_str());
            review_quiz(ctx, &quiz).into_response()
        }
        Err(e) => {
            let mut ctx = Context::new();
            let quiz_json = serde_json::to_string(&quiz).unwrap_or_default();
            ctx.insert("quiz", &quiz);
            ctx.insert("quiz_json", &quiz_json);
            render_error("teacher.html", Some(ViewState::Reviewing), ctx, &e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    code: Option<String>,
}

pub async fn student_page(Query(query): Query<CodeQuery>) -> Response {
    let raw = match query.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => return render("student.html", None, Context::new()).into_response(),
    };

    match raw.parse::<QuizCode>() {
        Ok(code) => Redirect::to(&format!("/student/{}", code)).into_response(),
        Err(_) => {
            let mut ctx = Context::new();
            ctx.insert("code", raw);
            render_error("student.html", None, ctx, &quiz_not_found())
        }
    }
}

async fn quiz_or_code_page(state: &AppState, code: &str) -> Result<Quiz, Response> {
    load_quiz(state, code).await.map(|(_, quiz)| quiz).map_err(|e| {
        let mut ctx = Context::new();
        ctx.insert("code", code);
        render_error("student.html", None, ctx, &e)
    })
}

pub async fn student_quiz(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    let quiz = match quiz_or_code_page(&state, &code).await {
        Ok(quiz) => quiz,
        Err(page) => return page,
    };

    let mut ctx = Context::new();
    ctx.insert("code", &code);
    ctx.insert("quiz", &quiz);
    render("student_quiz.html", Some(ViewState::Reviewing), ctx).into_response()
}

/// Collects `answer_0`, `answer_1`, ... into a list aligned with the quiz.
fn collect_answers(form: &HashMap<String, String>, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| form.get(&format!("answer_{}", i)).cloned().unwrap_or_default())
        .collect()
}

pub async fn student_submit(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let quiz = match quiz_or_code_page(&state, &code).await {
        Ok(quiz) => quiz,
        Err(page) => return page,
    };
    let answers = collect_answers(&form, quiz.questions.len());

    let mut ctx = Context::new();
    ctx.insert("code", &code);
    ctx.insert("quiz", &quiz);

    match grade_attempt(state.scorer.as_ref(), &quiz, &answers, state.grading_mode).await {
        Ok(report) => {
            ctx.insert("report", &report);
            render("student_quiz.html", Some(ViewState::Grading), ctx).into_response()
        }
        Err(e) => render_error("student_quiz.html", Some(ViewState::Reviewing), ctx, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::quiz::QuizQuestion;
    use crate::routes::test_support::{app_with, form_request, json_request, read_body};

    const ANSWER: &str = "Thomas Jefferson was the main author of the Declaration of Independence, \
        drafted in 1776 with edits from the committee.";

    fn sample_quiz() -> Quiz {
        Quiz {
            topic: "The American Revolution".into(),
            questions: vec![QuizQuestion {
                question: "Who was the main author of the Declaration of Independence?".into(),
                answer: ANSWER.into(),
            }],
        }
    }

    #[test]
    fn answers_align_with_questions() {
        let mut form = HashMap::new();
        form.insert("answer_1".to_string(), "second".to_string());
        form.insert("answer_7".to_string(), "ignored".to_string());
        assert_eq!(collect_answers(&form, 3), vec!["", "second", ""]);
    }

    #[tokio::test]
    async fn index_renders() {
        let (app, _) = app_with(vec![]);
        let response = app.oneshot(json_request(Method::GET, "/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(read_body(response).await.contains("/plagiarism-checker"));
    }

    #[tokio::test]
    async fn checker_page_shows_error_inline() {
        let (app, _) = app_with(vec![]);
        let response = app
            .oneshot(form_request(
                "/plagiarism-checker",
                &[("text1", "short"), ("text2", "short")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(read_body(response)
            .await
            .contains("Original text must be at least 100 characters long."));
    }

    #[tokio::test]
    async fn checker_page_shows_verdict() {
        let (app, _) = app_with(vec![]);
        let response = app
            .oneshot(form_request("/plagiarism-checker", &[("text1", ANSWER), ("text2", ANSWER)]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(body.contains("High similarity detected. Strong indication of plagiarism."));
    }

    #[tokio::test]
    async fn teacher_generates_then_saves() {
        let reply = serde_json::json!({
            "questions": [{"question": "What is chlorophyll?", "answer": "A green pigment in plants."}]
        })
        .to_string();
        let (app, state) = app_with(vec![reply]);
        let content = "Chlorophyll is the green pigment that lets plants absorb light. ".repeat(4);

        let response = app
            .clone()
            .oneshot(form_request(
                "/teacher",
                &[("topic", "Photosynthesis"), ("content", content.as_str()), ("questionCount", "1")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(body.contains("What is chlorophyll?"));
        assert!(body.contains("action=\"/teacher/save\""));

        let quiz_json = serde_json::to_string(&Quiz {
            topic: "Photosynthesis".into(),
            questions: vec![QuizQuestion {
                question: "What is chlorophyll?".into(),
                answer: "A green pigment in plants.".into(),
            }],
        })
        .unwrap();
        let response = app
            .oneshot(form_request("/teacher/save", &[("quiz", quiz_json.as_str())]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;

        let code: String = body
            .split("data-code=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string();
        let code: QuizCode = code.parse().unwrap();
        let saved = state.repo.load(&code).await.unwrap().unwrap();
        assert_eq!(saved.questions[0].question, "What is chlorophyll?");
    }

    #[tokio::test]
    async fn student_code_form_redirects() {
        let (app, _) = app_with(vec![]);
        let response = app
            .oneshot(json_request(Method::GET, "/student?code=123456", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/student/123456");
    }

    #[tokio::test]
    async fn malformed_code_in_query_is_not_found() {
        let (app, _) = app_with(vec![]);
        for uri in ["/student?code=12%0A34", "/student?code=abc"] {
            let response = app
                .clone()
                .oneshot(json_request(Method::GET, uri, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert!(response.headers().get("location").is_none());
            assert!(read_body(response).await.contains("Quiz not found."));
        }
    }

    #[tokio::test]
    async fn non_numeric_question_count_is_shown_inline() {
        let (app, _) = app_with(vec![]);
        let content = "Chlorophyll is the green pigment that lets plants absorb light. ".repeat(4);
        for count in ["", "3.5"] {
            let response = app
                .clone()
                .oneshot(form_request(
                    "/teacher",
                    &[("topic", "Leaf pigments"), ("content", content.as_str()), ("questionCount", count)],
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let body = read_body(response).await;
            assert!(body.contains("Number of questions must be a whole number."));
            assert!(body.contains("value=\"Leaf pigments\""));
        }
    }

    #[tokio::test]
    async fn unknown_quiz_page_is_not_found() {
        let (app, _) = app_with(vec![]);
        let response = app
            .oneshot(json_request(Method::GET, "/student/654321", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(read_body(response).await.contains("Quiz not found."));
    }

    #[tokio::test]
    async fn student_answers_are_graded() {
        let (app, state) = app_with(vec![]);
        let code = state.repo.save(&sample_quiz()).await.unwrap();
        let uri = format!("/student/{}", code);

        let response = app
            .clone()
            .oneshot(json_request(Method::GET, &uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(read_body(response).await.contains("name=\"answer_0\""));

        let response = app
            .oneshot(form_request(&uri, &[("answer_0", ANSWER)]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(body.contains("Excellent Work!"));
        assert!(body.contains("data-final-mark=\"100\""));
    }
}
