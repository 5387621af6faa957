use crate::domain::recommendation::{
    ActionPlan, AlternativePath, CareerGuide, Compensation, DetailedAnalysis, GovernmentSpecific,
    ProsAndCons, RecommendationRecord, Requirements, Sector,
};
use serde_json::{Map, Value};

pub const MIN_MATCH_SCORE: f64 = 0.65;
pub const MAX_MATCH_SCORE: f64 = 1.0;

/// A recommendation recognized in model output. Only `title` is guaranteed; everything else is
/// whatever the model managed to emit.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationDraft {
    pub title: String,
    pub match_score: Option<f64>,
    pub sector: Option<Sector>,
    pub body: Map<String, Value>,
}

impl RecommendationDraft {
    /// Recognizes a draft in a JSON object. `None` unless the object has a non-empty string title.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(body) = value else {
            return None;
        };
        let title = body.get("title")?.as_str()?.trim().to_string();
        if title.is_empty() {
            return None;
        }
        let match_score = body.get("match_score").and_then(score_of);
        let sector = body
            .get("sector")
            .and_then(Value::as_str)
            .and_then(Sector::from_label);

        Some(Self {
            title,
            match_score,
            sector,
            body,
        })
    }

    pub fn minimal(title: &str, match_score: Option<f64>, sector: Option<Sector>) -> Self {
        Self {
            title: title.to_string(),
            match_score,
            sector,
            body: Map::new(),
        }
    }

    /// Structural completion: every section present, scores clamped, sector defaulted.
    pub fn into_record(self, default_sector: Sector) -> RecommendationRecord {
        let body = &self.body;
        let section = |key: &str| body.get(key).and_then(Value::as_object);

        let analysis = section("detailed_analysis");
        let guide = section("career_guide");
        let pros = section("pros_and_cons");
        let reqs = section("requirements");
        let pay = section("compensation");
        let plan = section("action_plan");
        let gov = section("government_specific");

        RecommendationRecord {
            match_score: clamp_match_score(self.match_score),
            sector: self.sector.unwrap_or(default_sector),
            detailed_analysis: DetailedAnalysis {
                personality_fit: text(analysis, "personality_fit"),
                interest_alignment: text(analysis, "interest_alignment"),
                skill_match: text(analysis, "skill_match"),
                growth_potential: text(analysis, "growth_potential"),
            },
            career_guide: CareerGuide {
                overview: text(guide, "overview"),
                daily_responsibilities: list(guide, "daily_responsibilities"),
                work_environment: text(guide, "work_environment"),
                career_progression: list(guide, "career_progression"),
            },
            pros_and_cons: ProsAndCons {
                advantages: list(pros, "advantages"),
                challenges: list(pros, "challenges"),
            },
            requirements: Requirements {
                education: text(reqs, "education"),
                technical_skills: list(reqs, "technical_skills"),
                soft_skills: list(reqs, "soft_skills"),
                certifications: list(reqs, "certifications"),
            },
            compensation: Compensation {
                entry_level: text(pay, "entry_level"),
                mid_level: text(pay, "mid_level"),
                senior_level: text(pay, "senior_level"),
                benefits: list(pay, "benefits"),
            },
            action_plan: ActionPlan {
                immediate_steps: list(plan, "immediate_steps"),
                short_term_goals: list(plan, "short_term_goals"),
                long_term_goals: list(plan, "long_term_goals"),
                resources: list(plan, "resources"),
            },
            government_specific: GovernmentSpecific {
                exam_name: text(gov, "exam_name"),
                eligibility: text(gov, "eligibility"),
                preparation_strategy: text(gov, "preparation_strategy"),
                selection_stages: list(gov, "selection_stages"),
            },
            alternative_paths: alternative_paths(body.get("alternative_paths")),
            title: self.title,
        }
    }
}

/// Clamps into [0.65, 1.0]; absent, non-numeric and non-finite scores become the floor.
pub fn clamp_match_score(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s.is_finite() => s.clamp(MIN_MATCH_SCORE, MAX_MATCH_SCORE),
        _ => MIN_MATCH_SCORE,
    }
}

pub(crate) fn score_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn text(section: Option<&Map<String, Value>>, key: &str) -> String {
    match section.and_then(|s| s.get(key)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn list(section: Option<&Map<String, Value>>, key: &str) -> Vec<String> {
    match section.and_then(|s| s.get(key)) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn alternative_paths(value: Option<&Value>) -> Vec<AlternativePath> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(path) => Some(AlternativePath {
                title: text(Some(path), "title"),
                description: text(Some(path), "description"),
                transition_steps: list(Some(path), "transition_steps"),
            }),
            Value::String(title) => Some(AlternativePath {
                title: title.clone(),
                ..AlternativePath::default()
            }),
            _ => None,
        })
        .collect()
}
