use serde::{Deserialize, Serialize};
use std::ops::Deref;

pub const BATCH_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sector {
    Government,
    Private,
}

impl Sector {
    pub fn as_str(self) -> &'static str {
        match self {
            Sector::Government => "Government",
            Sector::Private => "Private",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Sector::Government => Sector::Private,
            Sector::Private => Sector::Government,
        }
    }

    /// Lenient label parsing for model output ("Govt.", "public sector", "PRIVATE").
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        if label.starts_with("gov") || label.starts_with("public") {
            Some(Sector::Government)
        } else if label.starts_with("private") {
            Some(Sector::Private)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedAnalysis {
    pub personality_fit: String,
    pub interest_alignment: String,
    pub skill_match: String,
    pub growth_potential: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerGuide {
    pub overview: String,
    pub daily_responsibilities: Vec<String>,
    pub work_environment: String,
    pub career_progression: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProsAndCons {
    pub advantages: Vec<String>,
    pub challenges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    pub education: String,
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compensation {
    pub entry_level: String,
    pub mid_level: String,
    pub senior_level: String,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPlan {
    pub immediate_steps: Vec<String>,
    pub short_term_goals: Vec<String>,
    pub long_term_goals: Vec<String>,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernmentSpecific {
    pub exam_name: String,
    pub eligibility: String,
    pub preparation_strategy: String,
    pub selection_stages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativePath {
    pub title: String,
    pub description: String,
    pub transition_steps: Vec<String>,
}

/// A schema-complete recommendation. Every section is always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub title: String,
    pub match_score: f64,
    pub sector: Sector,
    #[serde(default)]
    pub detailed_analysis: DetailedAnalysis,
    #[serde(default)]
    pub career_guide: CareerGuide,
    #[serde(default)]
    pub pros_and_cons: ProsAndCons,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub compensation: Compensation,
    #[serde(default)]
    pub action_plan: ActionPlan,
    #[serde(default)]
    pub government_specific: GovernmentSpecific,
    #[serde(default)]
    pub alternative_paths: Vec<AlternativePath>,
}

/// Exactly three records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationBatch([RecommendationRecord; BATCH_SIZE]);

impl RecommendationBatch {
    pub fn new(records: [RecommendationRecord; BATCH_SIZE]) -> Self {
        Self(records)
    }

    pub fn into_records(self) -> [RecommendationRecord; BATCH_SIZE] {
        self.0
    }
}

impl Deref for RecommendationBatch {
    type Target = [RecommendationRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<Vec<RecommendationRecord>> for RecommendationBatch {
    type Error = Vec<RecommendationRecord>;

    fn try_from(records: Vec<RecommendationRecord>) -> Result<Self, Self::Error> {
        <[RecommendationRecord; BATCH_SIZE]>::try_from(records).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, score: f64) -> RecommendationRecord {
        RecommendationRecord {
            title: title.to_string(),
            match_score: score,
            sector: Sector::Private,
            detailed_analysis: DetailedAnalysis::default(),
            career_guide: CareerGuide::default(),
            pros_and_cons: ProsAndCons::default(),
            requirements: Requirements::default(),
            compensation: Compensation::default(),
            action_plan: ActionPlan::default(),
            government_specific: GovernmentSpecific::default(),
            alternative_paths: Vec::new(),
        }
    }

    #[test]
    fn sector_labels_are_lenient() {
        assert_eq!(Sector::from_label("Government"), Some(Sector::Government));
        assert_eq!(Sector::from_label(" govt. "), Some(Sector::Government));
        assert_eq!(Sector::from_label("Public Sector"), Some(Sector::Government));
        assert_eq!(Sector::from_label("PRIVATE"), Some(Sector::Private));
        assert_eq!(Sector::from_label("NGO"), None);
    }

    #[test]
    fn batch_requires_exactly_three_records() {
        let two = vec![record("a", 0.9), record("b", 0.8)];
        assert!(RecommendationBatch::try_from(two).is_err());

        let three = vec![record("a", 0.9), record("b", 0.8), record("c", 0.7)];
        let batch = RecommendationBatch::try_from(three).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[2].title, "c");
    }

    #[test]
    fn batch_serializes_as_plain_array() {
        let batch = RecommendationBatch::new([record("a", 0.9), record("b", 0.8), record("c", 0.7)]);
        let value = serde_json::to_value(&batch).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["sector"], "Private");
        assert!(items[0]["pros_and_cons"]["advantages"].is_array());
    }
}
