use std::str::FromStr;
use std::time::Duration;

use crate::quiz::GradingMode;
use crate::scoring::ScoringStrategy;

#[derive(Clone, Debug)]
pub struct Config {
    pub claude_api_key: String,
    pub claude_model: Option<String>,
    pub llm_base_url: String,
    pub llm_timeout: Duration,
    pub llm_max_retries: u32,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub scoring_strategy: ScoringStrategy,
    pub grading_mode: GradingMode,
    pub embedding_dim: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let claude_api_key = std::env::var("CLAUDE_API_KEY")
            .map_err(|_| "CLAUDE_API_KEY must be set")?;
        let claude_model = std::env::var("CLAUDE_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty());
        let llm_base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string());
        let llm_timeout = Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", 120)?);
        let llm_max_retries = parse_var("LLM_MAX_RETRIES", 0)?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 5001)?;

        let scoring_strategy = parse_var("SCORING_STRATEGY", ScoringStrategy::Llm)?;
        let grading_mode = parse_var("GRADING_MODE", GradingMode::Correctness)?;
        let embedding_dim = parse_var("EMBEDDING_DIM", 256usize)?;
        if embedding_dim == 0 {
            return Err("EMBEDDING_DIM must be greater than zero".into());
        }

        Ok(Self {
            claude_api_key,
            claude_model,
            llm_base_url,
            llm_timeout,
            llm_max_retries,
            database_url,
            host,
            port,
            scoring_strategy,
            grading_mode,
            embedding_dim,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, Box<dyn std::error::Error + Send + Sync>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| format!("invalid value for {}: {}", name, e).into()),
        _ => Ok(default),
    }
}
