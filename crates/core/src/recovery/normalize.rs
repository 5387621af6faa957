use crate::domain::contract::{RecommendationDraft, MIN_MATCH_SCORE};
use crate::domain::recommendation::{RecommendationBatch, RecommendationRecord, Sector, BATCH_SIZE};
use std::collections::HashSet;

pub const ALTERNATIVE_SCORE_STEP: f64 = 0.05;
pub const PLACEHOLDER_BASE_SCORE: f64 = 0.85;

/// Turns recognized drafts into a batch of exactly three. `None` only when there are no drafts.
pub fn normalize(drafts: Vec<RecommendationDraft>) -> Option<RecommendationBatch> {
    let mut seen = HashSet::new();
    let mut records: Vec<RecommendationRecord> = drafts
        .into_iter()
        .enumerate()
        .map(|(position, draft)| draft.into_record(sector_for_position(position)))
        .filter(|record| seen.insert(record.title.trim().to_lowercase()))
        .collect();

    if records.len() > BATCH_SIZE {
        tracing::debug!(count = records.len(), "truncating surplus recommendations");
        records.truncate(BATCH_SIZE);
    }

    let first = records.first()?.clone();
    for slot in records.len()..BATCH_SIZE {
        records.push(alternative(&first, slot));
    }

    RecommendationBatch::try_from(records).ok()
}

fn alternative(first: &RecommendationRecord, slot: usize) -> RecommendationRecord {
    let mut record = first.clone();
    record.title = format!("Alternative Career Path {}", slot + 1);
    record.match_score =
        round_score((first.match_score - ALTERNATIVE_SCORE_STEP * slot as f64).max(MIN_MATCH_SCORE));
    record.sector = if slot % 2 == 1 {
        first.sector.flipped()
    } else {
        first.sector
    };
    record
}

pub fn sector_for_position(position: usize) -> Sector {
    if position % 2 == 0 {
        Sector::Private
    } else {
        Sector::Government
    }
}

pub fn placeholder_score(position: usize) -> f64 {
    round_score((PLACEHOLDER_BASE_SCORE - ALTERNATIVE_SCORE_STEP * position as f64).max(MIN_MATCH_SCORE))
}

fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(title: &str, score: f64, sector: &str) -> RecommendationDraft {
        RecommendationDraft::from_value(json!({
            "title": title,
            "match_score": score,
            "sector": sector,
            "detailed_analysis": {"skill_match": format!("{title} skills")}
        }))
        .unwrap()
    }

    #[test]
    fn empty_input_has_no_batch() {
        assert!(normalize(Vec::new()).is_none());
    }

    #[test]
    fn pads_with_alternatives_cloned_from_the_first() {
        let batch = normalize(vec![draft("Data Analyst", 0.9, "Private")]).unwrap();
        assert_eq!(batch[0].title, "Data Analyst");
        assert_eq!(batch[1].title, "Alternative Career Path 2");
        assert_eq!(batch[2].title, "Alternative Career Path 3");
        assert_eq!(batch[1].match_score, 0.85);
        assert_eq!(batch[2].match_score, 0.8);
        assert_eq!(batch[1].sector, Sector::Government);
        assert_eq!(batch[2].sector, Sector::Private);
        assert_eq!(batch[1].detailed_analysis.skill_match, "Data Analyst skills");
    }

    #[test]
    fn alternative_scores_never_drop_below_floor() {
        let batch = normalize(vec![draft("Clerk", 0.66, "Government")]).unwrap();
        assert_eq!(batch[1].match_score, 0.65);
        assert_eq!(batch[2].match_score, 0.65);
        assert_eq!(batch[1].sector, Sector::Private);
    }

    #[test]
    fn truncates_to_the_first_three() {
        let drafts = (0..5)
            .map(|i| draft(&format!("Role {i}"), 0.9 - 0.01 * i as f64, "Private"))
            .collect();
        let titles: Vec<_> = normalize(drafts).unwrap().iter().map(|r| r.title.clone()).collect();
        assert_eq!(titles, vec!["Role 0", "Role 1", "Role 2"]);
    }

    #[test]
    fn drops_duplicate_titles() {
        let batch = normalize(vec![
            draft("Teacher", 0.9, "Government"),
            draft("teacher ", 0.8, "Private"),
            draft("Librarian", 0.7, "Government"),
        ])
        .unwrap();
        assert_eq!(batch[0].title, "Teacher");
        assert_eq!(batch[1].title, "Librarian");
        assert_eq!(batch[2].title, "Alternative Career Path 3");
    }

    #[test]
    fn missing_sector_alternates_by_position() {
        let drafts = vec![
            RecommendationDraft::minimal("A", Some(0.9), None),
            RecommendationDraft::minimal("B", Some(0.8), None),
        ];
        let batch = normalize(drafts).unwrap();
        assert_eq!(batch[0].sector, Sector::Private);
        assert_eq!(batch[1].sector, Sector::Government);
    }

    #[test]
    fn placeholder_scores_descend() {
        assert_eq!(placeholder_score(0), 0.85);
        assert_eq!(placeholder_score(1), 0.8);
        assert_eq!(placeholder_score(2), 0.75);
        assert_eq!(placeholder_score(10), 0.65);
    }
}
