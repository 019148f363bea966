mod claude;
pub mod prompts;
mod reply;

pub use claude::ClaudeAgent;
pub use reply::parse_reply;

use async_trait::async_trait;

use crate::error::AppResult;

/// A text-in, text-out generative model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String>;
}
