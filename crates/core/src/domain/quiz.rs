use serde::{Deserialize, Serialize};

/// One answered quiz question. Multi-select questions carry several answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub question_id: String,
    #[serde(default)]
    pub answer: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_camel_case_question_id() {
        let parsed: QuizResponse =
            serde_json::from_str(r#"{"questionId":"q1","answer":["Math","Art"]}"#).unwrap();
        assert_eq!(parsed.question_id, "q1");
        assert_eq!(parsed.answer, vec!["Math", "Art"]);
    }
}
