use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::LanguageModel;
use crate::config::Config;
use crate::error::{AppError, AppResult};

const CLAUDE_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20240620",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;
const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorBody {
    error: Option<ClaudeError>,
}

#[derive(Debug, Deserialize)]
struct ClaudeError {
    message: Option<String>,
}

pub struct ClaudeAgent {
    client: Client,
    api_key: String,
    endpoint: String,
    models: Vec<String>,
    max_retries: u32,
    backoff: Duration,
}

impl ClaudeAgent {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.llm_timeout).build()?;

        let mut models: Vec<String> = CLAUDE_MODELS.iter().map(|m| m.to_string()).collect();
        if let Some(preferred) = &config.claude_model {
            models.retain(|m| m != preferred);
            models.insert(0, preferred.clone());
        }

        Ok(Self {
            client,
            api_key: config.claude_api_key.clone(),
            endpoint: format!("{}/v1/messages", config.llm_base_url.trim_end_matches('/')),
            models,
            max_retries: config.llm_max_retries,
            backoff: INITIAL_BACKOFF,
        })
    }

    /// The model every call starts with.
    pub fn preferred_model(&self) -> &str {
        &self.models[0]
    }
}

#[async_trait]
impl LanguageModel for ClaudeAgent {
    /// Each call starts from the preferred model. A 429 or 404 moves this
    /// call to the next model in the fallback list; other failures are
    /// retried up to `max_retries` times with doubling backoff.
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String> {
        let mut model_index = 0;
        let mut retry_count = 0;
        let mut backoff = self.backoff;

        loop {
            let model = self.models[model_index].as_str();
            debug!("Calling model {} (prompt length: {} chars)", model, prompt.len());

            let body = ClaudeRequest {
                model,
                max_tokens: MAX_TOKENS,
                system,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
            };

            let sent = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await;

            let failure = match sent {
                Ok(response) => {
                    let status = response.status();
                    let text = response
                        .text()
                        .await
                        .map_err(|e| AppError::Upstream(format!("Response read failed: {}", e)))?;

                    if status.is_success() {
                        let parsed: ClaudeResponse = serde_json::from_str(&text)
                            .map_err(|e| AppError::Upstream(format!("Parse error: {}", e)))?;
                        let reply: String = parsed
                            .content
                            .into_iter()
                            .filter(|block| block.block_type == "text")
                            .filter_map(|block| block.text)
                            .collect();
                        info!("Model {} replied ({} chars)", model, reply.len());
                        return Ok(reply);
                    }

                    if matches!(status, StatusCode::TOO_MANY_REQUESTS | StatusCode::NOT_FOUND)
                        && model_index + 1 < self.models.len()
                    {
                        warn!("Model {} unavailable ({}), trying next model", model, status);
                        model_index += 1;
                        retry_count = 0;
                        continue;
                    }

                    serde_json::from_str::<ClaudeErrorBody>(&text)
                        .ok()
                        .and_then(|b| b.error)
                        .and_then(|e| e.message)
                        .unwrap_or(text)
                }
                Err(e) => format!("Request failed: {}", e),
            };

            if retry_count >= self.max_retries {
                return Err(AppError::Upstream(format!(
                    "AI service error after {} attempts: {}",
                    retry_count + 1,
                    failure
                )));
            }

            retry_count += 1;
            warn!("Model call failed ({}), retrying in {:?}", failure, backoff);
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use crate::quiz::GradingMode;
    use crate::scoring::ScoringStrategy;

    fn config(base_url: &str, model: Option<&str>, max_retries: u32) -> Config {
        Config {
            claude_api_key: "test-key".into(),
            claude_model: model.map(str::to_string),
            llm_base_url: base_url.into(),
            llm_timeout: Duration::from_secs(5),
            llm_max_retries: max_retries,
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            scoring_strategy: ScoringStrategy::Llm,
            grading_mode: GradingMode::Correctness,
            embedding_dim: 16,
        }
    }

    /// Fake Messages endpoint. Answers with the queued responses in order
    /// and records which model each request asked for.
    struct FakeUpstream {
        responses: Mutex<VecDeque<(StatusCode, Value)>>,
        models: Mutex<Vec<String>>,
    }

    impl FakeUpstream {
        fn models(&self) -> Vec<String> {
            self.models.lock().unwrap().clone()
        }
    }

    async fn messages(
        State(upstream): State<Arc<FakeUpstream>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let model = body["model"].as_str().unwrap_or_default().to_string();
        upstream.models.lock().unwrap().push(model);
        let (status, reply) = upstream
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, json!({})));
        (status, Json(reply))
    }

    async fn serve(responses: Vec<(StatusCode, Value)>) -> (String, Arc<FakeUpstream>) {
        let upstream = Arc::new(FakeUpstream {
            responses: Mutex::new(responses.into()),
            models: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/v1/messages", post(messages))
            .with_state(upstream.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{}/", addr), upstream)
    }

    fn agent(base_url: &str, max_retries: u32) -> ClaudeAgent {
        let mut agent = ClaudeAgent::new(&config(base_url, None, max_retries)).unwrap();
        agent.backoff = Duration::from_millis(1);
        agent
    }

    fn text_reply(text: &str) -> (StatusCode, Value) {
        (StatusCode::OK, json!({ "content": [{ "type": "text", "text": text }] }))
    }

    fn error_reply(status: StatusCode, message: &str) -> (StatusCode, Value) {
        (status, json!({ "type": "error", "error": { "type": "api_error", "message": message } }))
    }

    #[test]
    fn preferred_model_goes_first() {
        let agent = ClaudeAgent::new(&config("http://localhost:9/", Some("claude-3-haiku-20240307"), 0)).unwrap();
        assert_eq!(agent.preferred_model(), "claude-3-haiku-20240307");
        assert_eq!(agent.models.len(), CLAUDE_MODELS.len());
        assert_eq!(agent.endpoint, "http://localhost:9/v1/messages");
    }

    #[tokio::test]
    async fn text_blocks_are_joined() {
        let (url, _) = serve(vec![(
            StatusCode::OK,
            json!({ "content": [
                { "type": "text", "text": "{\"score\": " },
                { "type": "tool_use", "id": "t1" },
                { "type": "text", "text": "42}" }
            ]}),
        )])
        .await;

        let reply = agent(&url, 0).complete("system", "prompt").await.unwrap();
        assert_eq!(reply, "{\"score\": 42}");
    }

    #[tokio::test]
    async fn rate_limit_falls_back_for_that_call_only() {
        let (url, upstream) = serve(vec![
            error_reply(StatusCode::TOO_MANY_REQUESTS, "rate limited"),
            text_reply("first"),
            text_reply("second"),
        ])
        .await;
        let agent = agent(&url, 0);

        assert_eq!(agent.complete("s", "p").await.unwrap(), "first");
        assert_eq!(agent.complete("s", "p").await.unwrap(), "second");
        assert_eq!(
            upstream.models(),
            vec![CLAUDE_MODELS[0], CLAUDE_MODELS[1], CLAUDE_MODELS[0]]
        );
    }

    #[tokio::test]
    async fn exhausted_fallback_list_is_upstream_error() {
        let responses = CLAUDE_MODELS
            .iter()
            .map(|m| error_reply(StatusCode::NOT_FOUND, &format!("model: {}", m)))
            .collect();
        let (url, upstream) = serve(responses).await;

        let err = agent(&url, 0).complete("s", "p").await.unwrap_err();
        let message = match err {
            AppError::Upstream(message) => message,
            other => panic!("expected upstream error, got {:?}", other),
        };
        assert_eq!(
            message,
            format!("AI service error after 1 attempts: model: {}", CLAUDE_MODELS[3])
        );
        assert_eq!(upstream.models(), CLAUDE_MODELS.to_vec());
    }

    #[tokio::test]
    async fn server_errors_are_retried_on_the_same_model() {
        let (url, upstream) = serve(vec![
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Overloaded"),
            error_reply(StatusCode::BAD_GATEWAY, "Overloaded"),
            text_reply("done"),
        ])
        .await;

        assert_eq!(agent(&url, 2).complete("s", "p").await.unwrap(), "done");
        assert_eq!(upstream.models(), vec![CLAUDE_MODELS[0]; 3]);
    }

    #[tokio::test]
    async fn retries_stop_at_the_limit() {
        let (url, upstream) = serve(vec![
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Overloaded"),
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Still overloaded"),
            text_reply("too late"),
        ])
        .await;

        let err = agent(&url, 1).complete("s", "p").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Upstream(ref m) if m == "AI service error after 2 attempts: Still overloaded"
        ));
        assert_eq!(upstream.models().len(), 2);
    }

    #[tokio::test]
    async fn non_json_error_body_is_reported_verbatim() {
        let (url, _) = serve(vec![(StatusCode::BAD_REQUEST, json!("bad request"))]).await;
        let err = agent(&url, 0).complete("s", "p").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Upstream(ref m) if m == "AI service error after 1 attempts: \"bad request\""
        ));
    }

    #[test]
    fn backoff_starts_at_two_seconds() {
        let agent = ClaudeAgent::new(&config("http://localhost:9", None, 3)).unwrap();
        assert_eq!(agent.backoff, Duration::from_secs(2));
        assert_eq!(agent.max_retries, 3);
    }
}
