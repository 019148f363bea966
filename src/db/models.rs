use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::quiz::{Quiz, QuizQuestion};

#[derive(Debug, FromRow)]
pub struct QuizRow {
    pub code: String,
    pub topic: String,
    pub questions: Json<Vec<QuizQuestion>>,
    pub created_at: DateTime<Utc>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Quiz {
            topic: row.topic,
            questions: row.questions.0,
        }
    }
}
