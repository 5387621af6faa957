//! Recovery of recommendation batches from raw model text. Every input, including the empty
//! string, produces exactly three records.

pub mod extract;
pub mod fallback;
pub mod normalize;
pub mod repair;
pub mod scanner;

use crate::domain::contract::RecommendationDraft;
use crate::domain::recommendation::RecommendationBatch;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Direct,
    Cleanup,
    PerObject,
    GlobalFallback,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Cleanup => "cleanup",
            Strategy::PerObject => "per_object",
            Strategy::GlobalFallback => "global_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Success(Vec<RecommendationDraft>),
    Continue,
}

struct Stage {
    strategy: Strategy,
    attempt: fn(&str) -> Attempt,
}

const STAGES: [Stage; 3] = [
    Stage {
        strategy: Strategy::Direct,
        attempt: direct,
    },
    Stage {
        strategy: Strategy::Cleanup,
        attempt: cleanup,
    },
    Stage {
        strategy: Strategy::PerObject,
        attempt: per_object,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub strategy: Strategy,
    pub batch: RecommendationBatch,
}

impl ParseOutcome {
    pub fn used_fallback(&self) -> bool {
        self.strategy == Strategy::GlobalFallback
    }
}

pub fn parse_and_normalize(text: &str) -> RecommendationBatch {
    parse_with_outcome(text).batch
}

pub fn parse_with_outcome(text: &str) -> ParseOutcome {
    if !text.trim().is_empty() {
        for stage in &STAGES {
            match (stage.attempt)(text) {
                Attempt::Success(drafts) => {
                    let count = drafts.len();
                    if let Some(batch) = normalize::normalize(drafts) {
                        tracing::debug!(
                            strategy = stage.strategy.as_str(),
                            drafts = count,
                            "recovered recommendations from model output"
                        );
                        return ParseOutcome {
                            strategy: stage.strategy,
                            batch,
                        };
                    }
                }
                Attempt::Continue => {
                    tracing::debug!(strategy = stage.strategy.as_str(), "strategy did not apply");
                }
            }
        }
    }

    tracing::warn!(
        raw_len = text.len(),
        "no recommendations recoverable from model output; returning default batch"
    );
    ParseOutcome {
        strategy: Strategy::GlobalFallback,
        batch: fallback::default_batch(),
    }
}

fn direct(text: &str) -> Attempt {
    match serde_json::from_str::<Value>(text) {
        Ok(document) => drafts_from_document(&document),
        Err(_) => Attempt::Continue,
    }
}

fn cleanup(text: &str) -> Attempt {
    let stripped = repair::strip_fences(text);
    let Some(object) = repair::outer_object(&stripped) else {
        return Attempt::Continue;
    };
    match serde_json::from_str::<Value>(&repair::repair(object)) {
        Ok(document) => drafts_from_document(&document),
        Err(_) => Attempt::Continue,
    }
}

fn per_object(text: &str) -> Attempt {
    let stripped = repair::strip_fences(text);
    let cleaned = repair::repair(repair::from_first_brace(&stripped));
    let drafts = extract::extract_drafts(&cleaned);
    if drafts.is_empty() {
        Attempt::Continue
    } else {
        Attempt::Success(drafts)
    }
}

/// Accepts `{"recommendations": [...]}` when the first entry has a title and a detailed analysis.
fn drafts_from_document(document: &Value) -> Attempt {
    let Some(items) = document.get("recommendations").and_then(Value::as_array) else {
        return Attempt::Continue;
    };
    let Some(first) = items.first() else {
        return Attempt::Continue;
    };
    if first.get("title").is_none() || first.get("detailed_analysis").is_none() {
        return Attempt::Continue;
    }

    let drafts: Vec<_> = items
        .iter()
        .cloned()
        .filter_map(RecommendationDraft::from_value)
        .collect();
    if drafts.is_empty() {
        Attempt::Continue
    } else {
        Attempt::Success(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_prose_inputs_fall_back() {
        for text in ["", "   \n", "Sorry, I can't help with that."] {
            let outcome = parse_with_outcome(text);
            assert!(outcome.used_fallback());
            assert_eq!(outcome.batch, fallback::default_batch());
        }
    }

    #[test]
    fn document_without_detailed_analysis_is_not_accepted_directly() {
        let text = r#"{"recommendations":[{"title":"Nurse","match_score":0.9}]}"#;
        let outcome = parse_with_outcome(text);
        assert_eq!(outcome.strategy, Strategy::PerObject);
        assert_eq!(outcome.batch[0].title, "Nurse");
    }

    #[test]
    fn empty_recommendations_array_falls_back() {
        let outcome = parse_with_outcome(r#"{"recommendations": []}"#);
        assert!(outcome.used_fallback());
    }

    #[test]
    fn strategy_labels_are_stable() {
        assert_eq!(Strategy::PerObject.as_str(), "per_object");
        assert_eq!(
            serde_json::to_value(Strategy::GlobalFallback).unwrap(),
            "global_fallback"
        );
    }
}
