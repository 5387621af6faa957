use crate::domain::recommendation::RecommendationBatch;
use once_cell::sync::Lazy;

static DEFAULT_BATCH: Lazy<RecommendationBatch> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../assets/default_recommendations.json"))
        .expect("embedded default recommendations must be a valid batch")
});

pub fn default_batch() -> RecommendationBatch {
    DEFAULT_BATCH.clone()
}
