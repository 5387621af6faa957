use crate::domain::contract::{clamp_match_score, score_of, RecommendationDraft};
use crate::domain::recommendation::Sector;
use crate::recovery::normalize::{placeholder_score, sector_for_position};
use crate::recovery::repair;
use crate::recovery::scanner::{self, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""title"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

pub const MINIMAL_DRAFT_SCORE: f64 = 0.75;

#[derive(Debug, Clone)]
struct Candidate {
    title: String,
    object: Option<Span>,
}

/// Every recommendation that can be located in `cleaned`, in order of appearance. Objects that
/// do not parse degrade to a minimal draft, then to a placeholder; a located title is never lost.
pub fn extract_drafts(cleaned: &str) -> Vec<RecommendationDraft> {
    let mut drafts: Vec<RecommendationDraft> = Vec::new();
    for (position, candidate) in candidates(cleaned).into_iter().enumerate() {
        let ceiling = drafts.last().map(|prev| clamp_match_score(prev.match_score));
        drafts.push(recover(cleaned, &candidate, position, ceiling));
    }
    drafts
}

// Invented scores never outrank the recommendation before them.
fn synthesized_score(base: f64, ceiling: Option<f64>) -> f64 {
    ceiling.map_or(base, |ceiling| base.min(ceiling))
}

fn candidates(text: &str) -> Vec<Candidate> {
    let objects = scanner::object_spans(text);

    let found: Vec<Candidate> = TITLE
        .captures_iter(text)
        .filter_map(|caps| {
            let key = caps.get(0)?;
            let title = unescape(caps.get(1)?.as_str());
            if title.is_empty() {
                return None;
            }
            Some(Candidate {
                title,
                object: scanner::enclosing(&objects, key.start()),
            })
        })
        .collect();

    // Recommendations sit at the shallowest titled depth; deeper titles belong to nested
    // alternative_paths entries.
    let Some(top) = found.iter().filter_map(|c| c.object.map(|o| o.depth)).min() else {
        return found;
    };

    let mut seen_starts = Vec::new();
    found
        .into_iter()
        .filter(|c| match c.object {
            Some(object) if object.depth == top => {
                if seen_starts.contains(&object.start) {
                    false
                } else {
                    seen_starts.push(object.start);
                    true
                }
            }
            _ => false,
        })
        .collect()
}

fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\""))
        .unwrap_or_else(|_| raw.to_string())
        .trim()
        .to_string()
}

fn recover(
    text: &str,
    candidate: &Candidate,
    position: usize,
    ceiling: Option<f64>,
) -> RecommendationDraft {
    let Some(object) = candidate.object.and_then(|span| span.slice(text)) else {
        tracing::debug!(title = %candidate.title, "recommendation object is unterminated");
        return placeholder(&candidate.title, position, ceiling);
    };

    let repaired = repair::repair_arrays(&repair::repair(object));
    if let Some(draft) = serde_json::from_str::<Value>(&repaired)
        .ok()
        .and_then(RecommendationDraft::from_value)
    {
        return draft;
    }

    if let Ok(Value::Object(fields)) =
        serde_json::from_str::<Value>(&repair::simplify_arrays(&repaired))
    {
        tracing::debug!(title = %candidate.title, "recovered minimal recommendation");
        let score = fields
            .get("match_score")
            .and_then(score_of)
            .unwrap_or_else(|| synthesized_score(MINIMAL_DRAFT_SCORE, ceiling));
        let sector = fields
            .get("sector")
            .and_then(Value::as_str)
            .and_then(Sector::from_label)
            .unwrap_or(Sector::Private);
        let mut draft = RecommendationDraft::minimal(&candidate.title, Some(score), Some(sector));
        draft
            .body
            .insert("detailed_analysis".to_string(), stock_analysis(&candidate.title));
        return draft;
    }

    tracing::debug!(title = %candidate.title, "recommendation object unparseable; using placeholder");
    placeholder(&candidate.title, position, ceiling)
}

fn stock_analysis(title: &str) -> Value {
    json!({
        "personality_fit": format!("Your quiz responses point to traits that suit a career as {title}."),
        "interest_alignment": format!("Your stated interests overlap with the day-to-day work of a {title}."),
        "skill_match": format!("Several of the skills you described transfer directly to {title} roles."),
        "growth_potential": format!("{title} offers steady long-term growth for motivated candidates.")
    })
}

pub fn placeholder(title: &str, position: usize, ceiling: Option<f64>) -> RecommendationDraft {
    let sector = sector_for_position(position);
    let score = synthesized_score(placeholder_score(position), ceiling);
    let value = json!({
        "title": title,
        "match_score": score,
        "sector": sector.as_str(),
        "detailed_analysis": stock_analysis(title),
        "career_guide": {
            "overview": format!("A {title} applies specialised knowledge to solve practical problems in their field."),
            "daily_responsibilities": [
                "Plan and prioritise the day's tasks",
                "Collaborate with colleagues and stakeholders",
                "Document and review completed work"
            ],
            "work_environment": "A mix of independent and team-based work.",
            "career_progression": ["Entry level", "Experienced professional", "Senior or lead role"]
        },
        "pros_and_cons": {
            "advantages": ["Clear path for skill development", "Meaningful, visible work"],
            "challenges": ["Requires continuous learning", "Competitive entry"]
        },
        "requirements": {
            "education": format!("A relevant degree or diploma for {title} roles."),
            "technical_skills": ["Domain fundamentals", "Digital literacy"],
            "soft_skills": ["Communication", "Problem solving", "Time management"],
            "certifications": []
        },
        "compensation": {
            "entry_level": "Varies by employer and location",
            "mid_level": "Grows with experience and specialisation",
            "senior_level": "Competitive for experienced professionals",
            "benefits": ["Professional development opportunities"]
        },
        "action_plan": {
            "immediate_steps": [format!("Research what a {title} does day to day"), "Talk to people working in the field"],
            "short_term_goals": ["Build foundational skills", "Complete an introductory course"],
            "long_term_goals": ["Gain hands-on experience", "Grow into a specialised role"],
            "resources": ["Online courses", "Professional associations"]
        },
        "government_specific": {
            "exam_name": "",
            "eligibility": "",
            "preparation_strategy": "",
            "selection_stages": []
        },
        "alternative_paths": []
    });

    match RecommendationDraft::from_value(value) {
        Some(draft) => draft,
        None => RecommendationDraft::minimal(title, Some(score), Some(sector)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_each_complete_object() {
        let text = r#"{"recommendations": [
            {"title": "Nurse", "match_score": 0.9, "sector": "Government", "detailed_analysis": {}},
            {"title": "Editor", "match_score": 0.8, "sector": "Private", "detailed_analysis": {}}
        ] broken"#;
        let drafts = extract_drafts(text);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "Nurse");
        assert_eq!(drafts[0].sector, Some(Sector::Government));
        assert_eq!(drafts[1].match_score, Some(0.8));
    }

    #[test]
    fn ignores_nested_alternative_path_titles() {
        let text = r#"[{"title": "Architect", "alternative_paths": [{"title": "Urban Planner"}]},
            {"title": "Engineer", "alternative_paths": [{"title": "Surveyor"}]}"#;
        let titles: Vec<_> = extract_drafts(text).into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["Architect", "Engineer"]);
    }

    #[test]
    fn title_found_after_nested_sections_still_resolves_its_object() {
        let text = r#"[{"detailed_analysis": {"skill_match": "x"}, "title": "Baker", "match_score": 0.7}]"#;
        let drafts = extract_drafts(text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Baker");
        assert_eq!(drafts[0].match_score, Some(0.7));
    }

    #[test]
    fn repairs_unquoted_array_items_inside_an_object() {
        let text = r#"{"title": "Analyst", "match_score": 0.8, "requirements": {"technical_skills": [SQL, Excel]}}"#;
        let drafts = extract_drafts(text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].body["requirements"]["technical_skills"][1], "Excel");
    }

    #[test]
    fn falls_back_to_minimal_draft_when_only_arrays_are_broken() {
        let text = r#"{"title": "Designer", "match_score": 0.77, "sector": "Private", "pros_and_cons": {"advantages": [{"x": }]}}"#;
        let drafts = extract_drafts(text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Designer");
        assert_eq!(drafts[0].match_score, Some(0.77));
        assert_eq!(drafts[0].body.len(), 1);
        let analysis = &drafts[0].body["detailed_analysis"];
        assert!(analysis["skill_match"].as_str().is_some_and(|s| s.contains("Designer")));
    }

    #[test]
    fn minimal_draft_without_score_stays_below_previous() {
        let text = r#"[{"title": "Cook", "match_score": 0.7, "detailed_analysis": {}},
            {"title": "Baker", "sector": "Private", "pros_and_cons": {"advantages": [{"x": }]}}]"#;
        let drafts = extract_drafts(text);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[1].title, "Baker");
        assert_eq!(drafts[1].match_score, Some(0.7));
    }

    #[test]
    fn placeholder_never_outranks_previous_recommendation() {
        let text = r#"[{"title": "A", "match_score": 0.7, "detailed_analysis": {}},
            {"title": "B", "match_score": 0.68, "detailed_analysis": {}},
            {"title": "C", "match_score": 0.9, "detailed_analysis": {"skill_match": "trunc"#;
        let scores: Vec<_> = extract_drafts(text).iter().map(|d| d.match_score).collect();
        assert_eq!(scores, vec![Some(0.7), Some(0.68), Some(0.68)]);
    }

    #[test]
    fn apostrophe_in_unquoted_item_keeps_the_object() {
        let text = r#"{"recommendations":[{"title":"Chef","match_score":0.91,"sector":"Government","detailed_analysis":{"skill_match":"knives"},"requirements":{"soft_skills":[Can't stop, Teamwork]}}]}"#;
        let drafts = extract_drafts(&repair::repair(text));
        assert_eq!(drafts.len(), 1);
        let chef = &drafts[0];
        assert_eq!(chef.match_score, Some(0.91));
        assert_eq!(chef.sector, Some(Sector::Government));
        assert_eq!(chef.body["detailed_analysis"]["skill_match"], "knives");
        assert_eq!(chef.body["requirements"]["soft_skills"][0], "Can't stop");
    }

    #[test]
    fn unterminated_object_becomes_placeholder() {
        let text = r#"[{"title": "Pilot", "match_score": 0.9, "detailed_analysis": {"personality_fit": "Cal"#;
        let drafts = extract_drafts(text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Pilot");
        assert!(drafts[0].body.contains_key("career_guide"));
        assert_eq!(drafts[0].match_score, Some(placeholder_score(0)));
    }

    #[test]
    fn unescapes_titles() {
        let text = r#"{"title": "R&D \"Lead\"", "match_score": 0.8"#;
        let drafts = extract_drafts(text);
        assert_eq!(drafts[0].title, "R&D \"Lead\"");
    }

    #[test]
    fn no_titles_yields_nothing() {
        assert!(extract_drafts(r#"{"name": "x"}"#).is_empty());
        assert!(extract_drafts("").is_empty());
    }
}
