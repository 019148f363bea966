//! Prompt templates sent to the language model.

use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const PLAGIARISM_SYSTEM: &str = "You are an AI-based plagiarism checker. \
Reply with a single JSON object and nothing else.";

const PLAGIARISM_PROMPT: &str = r#"Compare the Original Text and the Comparison Text. Analyze them for:

- Exact Match: check if text is copied word-for-word.
- Paraphrasing: check if the meaning is the same but words are changed.
- Semantic Similarity: check if the texts convey a similar idea.

Finally, give a plagiarism score (0-100%) using this scale:
- 90-100% -> Exact / near exact copy
- 70-89% -> Paraphrased but meaning is preserved
- 40-69% -> Partial overlap in meaning
- 0-39% -> Mostly original / unrelated

Format the output as JSON with "plagiarismScore" (a number) and "reason" (a short explanation) fields.

Original Text:
{{text1}}

Comparison Text:
{{text2}}
"#;

pub const QUIZ_SYSTEM: &str = "You are an expert educator. \
Reply with a single JSON object and nothing else.";

const QUIZ_PROMPT: &str = r#"Your task is to create a quiz based on the provided content.

Topic: {{topic}}
Number of Questions: {{count}}

Please generate exactly {{count}} questions and their corresponding correct answers from the following content. The questions should be relevant to the specified topic.

Content:
{{content}}

Format the output as a JSON object containing a "questions" array, where each element is an object with "question" and "answer" fields.
"#;

pub fn plagiarism_prompt(text1: &str, text2: &str) -> String {
    fill(PLAGIARISM_PROMPT, &[("text1", text1), ("text2", text2)])
}

pub fn quiz_prompt(topic: &str, content: &str, count: u8) -> String {
    let count = count.to_string();
    fill(
        QUIZ_PROMPT,
        &[("topic", topic), ("count", &count), ("content", content)],
    )
}

/// Substitutes `{{name}}` placeholders in one pass. Substituted values are
/// never rescanned, so user text containing braces is left alone.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"));
    re.replace_all(template, |caps: &Captures| {
        vars.iter()
            .find(|(name, _)| *name == &caps[1])
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}
