use anyhow::Context;
use careerpath_core::domain::quiz::QuizResponse;
use std::path::Path;

/// Accepts either a bare array of responses or `{"responses": [...]}` as posted to the API.
pub fn load_responses(path: &Path) -> anyhow::Result<Vec<QuizResponse>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_responses(&text).with_context(|| format!("invalid quiz responses in {}", path.display()))
}

fn parse_responses(text: &str) -> anyhow::Result<Vec<QuizResponse>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let responses = match value {
        serde_json::Value::Object(mut body) => body
            .remove("responses")
            .context("expected a \"responses\" array")?,
        other => other,
    };
    Ok(serde_json::from_value(responses)?)
}
