mod agents;
mod config;
mod db;
mod error;
mod quiz;
mod routes;
mod scoring;
mod state;
mod storage;
mod templates;
mod validate;

use std::sync::Arc;

use agents::{ClaudeAgent, LanguageModel};
use quiz::QuizGenerator;
use scoring::{EmbeddingScorer, HashingEmbedder, LlmScorer, Scorer, ScoringStrategy};
use storage::{MemoryQuizRepository, QuizRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "testforge=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;

    let agent = ClaudeAgent::new(&config)?;
    tracing::info!("Preferred model: {}", agent.preferred_model());
    let model: Arc<dyn LanguageModel> = Arc::new(agent);

    let scorer: Arc<dyn Scorer> = match config.scoring_strategy {
        ScoringStrategy::Llm => Arc::new(LlmScorer::new(model.clone())),
        ScoringStrategy::Embedding => Arc::new(EmbeddingScorer::new(HashingEmbedder::new(
            config.embedding_dim,
        ))),
    };

    let repo: Arc<dyn QuizRepository> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Storing quizzes in Postgres");
            Arc::new(db::PgQuizRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, quizzes are kept in memory only");
            Arc::new(MemoryQuizRepository::new())
        }
    };

    tracing::info!(
        "Scoring with {:?}, grading in {:?} mode",
        config.scoring_strategy,
        config.grading_mode
    );

    let state = Arc::new(state::AppState {
        repo,
        scorer,
        generator: QuizGenerator::new(model),
        grading_mode: config.grading_mode,
    });

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("TestForge listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
