use crate::domain::quiz::QuizResponse;

const OUTPUT_CONTRACT: &str = include_str!("../../assets/output_contract.txt");

const PREAMBLE: &str = "You are an experienced career counsellor. Analyse the respondent below and \
recommend the three careers that fit them best, covering both government and private sector options.";

#[derive(Debug, Clone, Copy)]
pub enum PromptInput<'a> {
    Quiz(&'a [QuizResponse]),
    FreeText(&'a str),
}

impl PromptInput<'_> {
    pub fn source(&self) -> &'static str {
        match self {
            PromptInput::Quiz(_) => "quiz",
            PromptInput::FreeText(_) => "text",
        }
    }
}

pub fn compose(input: PromptInput<'_>) -> String {
    match input {
        PromptInput::Quiz(responses) => quiz_prompt(responses),
        PromptInput::FreeText(text) => text_prompt(text),
    }
}

pub fn quiz_prompt(responses: &[QuizResponse]) -> String {
    let answers = if responses.is_empty() {
        "(no quiz responses were provided)".to_string()
    } else {
        responses
            .iter()
            .map(|r| {
                let answer = if r.answer.is_empty() {
                    "(no answer)".to_string()
                } else {
                    r.answer.join("; ")
                };
                format!("- Question {}: {answer}", r.question_id)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!("{PREAMBLE}\n\nCareer assessment quiz responses:\n{answers}\n\n{OUTPUT_CONTRACT}")
}

pub fn text_prompt(text: &str) -> String {
    format!(
        "{PREAMBLE}\n\nThe respondent described their interests, skills and goals in their own words:\n\
\"\"\"\n{}\n\"\"\"\n\n{OUTPUT_CONTRACT}",
        text.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(id: &str, answers: &[&str]) -> QuizResponse {
        QuizResponse {
            question_id: id.to_string(),
            answer: answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn quiz_prompt_lists_every_answer_in_order() {
        let prompt = quiz_prompt(&[
            response("q1", &["Solving puzzles"]),
            response("q2", &["Math", "Art"]),
            response("q3", &[]),
        ]);
        let q1 = prompt.find("- Question q1: Solving puzzles").unwrap();
        let q2 = prompt.find("- Question q2: Math; Art").unwrap();
        let q3 = prompt.find("- Question q3: (no answer)").unwrap();
        assert!(q1 < q2 && q2 < q3);
    }

    #[test]
    fn empty_quiz_still_produces_full_contract() {
        let prompt = quiz_prompt(&[]);
        assert!(prompt.contains("(no quiz responses were provided)"));
        assert!(prompt.contains("\"recommendations\""));
        assert!(prompt.contains("EXACTLY 3 recommendations"));
    }

    #[test]
    fn contract_carries_every_numbered_rule() {
        let prompt = text_prompt("I love animals and the outdoors");
        for rule in [
            "1. Return EXACTLY 3 recommendations",
            "2. Every match_score MUST be a number between 0.65 and 1.0",
            "3. Include a mix of sectors",
            "4. Fill in EVERY field completely",
            "5. Every recommendation title MUST be unique",
            "6. Order the recommendations by match_score, highest first",
        ] {
            assert!(prompt.contains(rule), "missing rule: {rule}");
        }
        assert!(prompt.contains("I love animals and the outdoors"));
    }

    #[test]
    fn compose_is_deterministic() {
        let responses = [response("q1", &["Yes"])];
        assert_eq!(
            compose(PromptInput::Quiz(&responses)),
            compose(PromptInput::Quiz(&responses))
        );
        assert_eq!(PromptInput::FreeText("x").source(), "text");
    }
}
