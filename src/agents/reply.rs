use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

/// Pulls the JSON object out of a model reply. Models wrap their answer in
/// markdown fences or add a sentence before it often enough that the raw
/// text can't be handed to serde directly.
pub fn extract_json(reply: &str) -> Option<&str> {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    let fenced = FENCED
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*\})\s*```").expect("valid regex"));

    if let Some(caps) = fenced.captures(reply) {
        return caps.get(1).map(|m| m.as_str());
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Decodes the JSON object in `reply` into `T`. Returns `None` when the
/// reply is empty or holds nothing `T` can be built from.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Option<T> {
    let json = extract_json(reply)?;
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Unparseable model reply: {}", e);
            None
        }
    }
}
