use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

const EXCERPT_CHARS: usize = 200;

/// Where a model call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    /// Non-2xx status from the service.
    Http,
    /// 2xx, but no generated text at the expected envelope path.
    Envelope,
}

impl CallStage {
    pub fn as_str(self) -> &'static str {
        match self {
            CallStage::Http => "http",
            CallStage::Envelope => "envelope",
        }
    }
}

/// A failed model call, with the raw body kept for diagnostics.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: CallStage,
    pub status: Option<u16>,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub fn new(provider: Provider, stage: CallStage, detail: impl Into<String>, body: &str) -> Self {
        Self {
            provider,
            stage,
            status: None,
            detail: detail.into(),
            raw_output: Some(body.to_string()),
            raw_response_json: serde_json::from_str(body).ok(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    fn excerpt(&self) -> &str {
        let raw = self.raw_output.as_deref().unwrap_or("");
        match raw.char_indices().nth(EXCERPT_CHARS) {
            Some((end, _)) => &raw[..end],
            None => raw,
        }
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} call failed at {}", self.provider.as_str(), self.stage.as_str())?;
        if let Some(status) = self.status {
            write!(f, " (status={status})")?;
        }
        write!(f, ": {}", self.detail)?;
        let excerpt = self.excerpt();
        if !excerpt.is_empty() {
            write!(f, " body={excerpt:?}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LlmDiagnosticsError {}
