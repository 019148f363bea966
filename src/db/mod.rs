mod models;

pub use models::*;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::quiz::Quiz;
use crate::storage::{generate_quiz_code, QuizCode, QuizRepository};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Quizzes kept in the `quizzes` table, questions stored as JSONB.
pub struct PgQuizRepository {
    pool: PgPool,
}

impl PgQuizRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizRepository for PgQuizRepository {
    async fn save(&self, quiz: &Quiz) -> AppResult<QuizCode> {
        let code = generate_quiz_code();
        sqlx::query(
            r#"
            INSERT INTO quizzes (code, topic, questions)
            VALUES ($1, $2, $3)
            ON CONFLICT (code) DO UPDATE
            SET topic = EXCLUDED.topic, questions = EXCLUDED.questions, created_at = NOW()
            "#,
        )
        .bind(code.as_str())
        .bind(&quiz.topic)
        .bind(Json(&quiz.questions))
        .execute(&self.pool)
        .await?;

        info!("Saved quiz '{}' as {}", quiz.topic, code);
        Ok(code)
    }

    async fn load(&self, code: &QuizCode) -> AppResult<Option<Quiz>> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT code, topic, questions, created_at FROM quizzes WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = &row {
            debug!("Loaded quiz {} created {}", row.code, row.created_at);
        }
        Ok(row.map(Quiz::from))
    }
}
