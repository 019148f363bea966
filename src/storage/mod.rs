use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::quiz::Quiz;

pub const QUIZ_CODE_LEN: usize = 6;

/// Six ASCII digits identifying a saved quiz.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuizCode(String);

impl QuizCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for QuizCode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == QUIZ_CODE_LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(AppError::validation("code", "Quiz code must be 6 digits."))
        }
    }
}

impl TryFrom<String> for QuizCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QuizCode> for String {
    fn from(code: QuizCode) -> Self {
        code.0
    }
}

impl fmt::Display for QuizCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn generate_quiz_code() -> QuizCode {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    QuizCode(format!("{:06}", n))
}

/// Keyed store of saved quizzes. Codes are not checked for collisions: a
/// save that draws an existing code replaces the older quiz.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn save(&self, quiz: &Quiz) -> AppResult<QuizCode>;
    async fn load(&self, code: &QuizCode) -> AppResult<Option<Quiz>>;
}

#[derive(Default)]
pub struct MemoryQuizRepository {
    quizzes: RwLock<HashMap<QuizCode, Quiz>>,
}

impl MemoryQuizRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for MemoryQuizRepository {
    async fn save(&self, quiz: &Quiz) -> AppResult<QuizCode> {
        let code = generate_quiz_code();
        self.quizzes
            .write()
            .await
            .insert(code.clone(), quiz.clone());
        tracing::info!("Saved quiz '{}' as {}", quiz.topic, code);
        Ok(code)
    }

    async fn load(&self, code: &QuizCode) -> AppResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(code).cloned())
    }
}
