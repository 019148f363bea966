mod grading;

pub use grading::{grade_attempt, GradeReport, GradingMode};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::agents::{parse_reply, prompts, LanguageModel};
use crate::error::{AppError, AppResult};
use crate::validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    pub topic: String,
    pub content: String,
    pub question_count: i64,
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestions {
    questions: Vec<QuizQuestion>,
}

const NO_RESPONSE: &str = "Failed to get a response from the AI model for quiz generation.";

pub struct QuizGenerator {
    model: Arc<dyn LanguageModel>,
}

impl QuizGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn generate(&self, request: &GenerateQuizRequest) -> AppResult<Quiz> {
        let count = validate::quiz_request(
            &request.topic,
            &request.content,
            request.question_count,
        )?;
        let topic = request.topic.trim();

        info!("Generating {} questions on '{}'", count, topic);
        let prompt = prompts::quiz_prompt(topic, request.content.trim(), count);
        let reply = self.model.complete(prompts::QUIZ_SYSTEM, &prompt).await?;

        let generated: GeneratedQuestions =
            parse_reply(&reply).ok_or_else(|| AppError::Upstream(NO_RESPONSE.to_string()))?;

        let mut questions: Vec<QuizQuestion> = generated
            .questions
            .into_iter()
            .map(|q| QuizQuestion {
                question: q.question.trim().to_string(),
                answer: q.answer.trim().to_string(),
            })
            .filter(|q| !q.question.is_empty() && !q.answer.is_empty())
            .collect();

        if questions.is_empty() {
            return Err(AppError::Upstream(NO_RESPONSE.to_string()));
        }
        if questions.len() < count as usize {
            warn!(
                "Model returned {} of {} requested questions",
                questions.len(),
                count
            );
        }
        questions.truncate(count as usize);

        Ok(Quiz {
            topic: topic.to_string(),
            questions,
        })
    }
}
