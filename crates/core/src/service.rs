use crate::domain::quiz::QuizResponse;
use crate::domain::recommendation::RecommendationBatch;
use crate::llm::prompt::{self, PromptInput};
use crate::llm::TextGenerator;
use crate::recovery::{self, ParseOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerRecommendations {
    pub recommendations: RecommendationBatch,
}

/// Everything one generation produced, for callers that persist or audit it.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub prompt: String,
    pub raw_text: String,
    pub outcome: ParseOutcome,
}

/// Prompt, one model call, recovery. Only the model call can fail.
#[derive(Debug, Clone)]
pub struct RecommendationService<C> {
    client: C,
}

impl<C: TextGenerator> RecommendationService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn generate_career_recommendations(
        &self,
        responses: &[QuizResponse],
    ) -> anyhow::Result<CareerRecommendations> {
        let report = self.generate(PromptInput::Quiz(responses)).await?;
        Ok(CareerRecommendations {
            recommendations: report.outcome.batch,
        })
    }

    pub async fn generate_text_based_recommendations(
        &self,
        free_text: &str,
    ) -> anyhow::Result<RecommendationBatch> {
        let report = self.generate(PromptInput::FreeText(free_text)).await?;
        Ok(report.outcome.batch)
    }

    pub async fn generate(&self, input: PromptInput<'_>) -> anyhow::Result<GenerationReport> {
        let prompt = prompt::compose(input);
        let raw_text = self.client.generate_text(&prompt).await?;
        let outcome = recovery::parse_with_outcome(&raw_text);

        if outcome.used_fallback() {
            tracing::warn!(
                provider = self.client.provider().as_str(),
                source = input.source(),
                raw_len = raw_text.len(),
                "model output unrecoverable; default recommendations returned"
            );
        } else {
            tracing::info!(
                provider = self.client.provider().as_str(),
                source = input.source(),
                strategy = outcome.strategy.as_str(),
                "recommendations generated"
            );
        }

        Ok(GenerationReport {
            prompt,
            raw_text,
            outcome,
        })
    }
}
