use super::GenerationError;
use crate::model::{IdGenerator, Question, QuestionOption, QuestionType};
use log::{debug, warn};
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static FENCE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("fence start regex"));
static FENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("fence end regex"));

/// Strips the code fence a model may wrap around its JSON despite being told not to.
pub fn clean_json_text(text: &str) -> String {
    let trimmed = text.trim();
    let without_start = FENCE_START.replace(trimmed, "");
    FENCE_END.replace(&without_start, "").into_owned()
}

// question as the model returns it, ids are optional
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(rename = "type")]
    kind: QuestionType,
    #[serde(default)]
    difficulty: Option<String>,
    content: String,
    #[serde(default)]
    options: Option<Vec<RawOption>>,
    #[serde(default)]
    correct_option_id: Option<String>,
    #[serde(default)]
    short_answer: Option<String>,
    explanation: String,
}

#[derive(Deserialize, Debug)]
struct RawOption {
    #[serde(default)]
    id: Option<String>,
    content: String,
}

/// Parses a question batch and assigns client-side ids.
///
/// Every question gets a fresh id. Options keep the id the model gave them, since
/// `correctOptionId` refers to it, and get a fresh one when it is missing or repeated.
/// Any malformed element fails the whole batch.
pub fn parse_questions<R: Rng>(text: &str, rng: &mut R) -> Result<Vec<Question>, GenerationError> {
    let cleaned = clean_json_text(text);
    if cleaned.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let raw: Vec<RawQuestion> = serde_json::from_str(&cleaned).map_err(|e| {
        debug!("malformed model output: {}", text);
        GenerationError::MalformedData(e)
    })?;

    let mut question_ids = IdGenerator::new();
    let questions: Vec<Question> = raw
        .into_iter()
        .map(|q| {
            let mut option_ids = IdGenerator::new();
            let options = q
                .options
                .unwrap_or_default()
                .into_iter()
                .map(|o| {
                    let id = match o.id.filter(|id| !id.trim().is_empty()) {
                        Some(id) if option_ids.reserve(&id) => id,
                        _ => option_ids.next_id(&mut *rng),
                    };
                    QuestionOption {
                        id,
                        content: o.content,
                    }
                })
                .collect();

            Question {
                id: question_ids.next_id(&mut *rng),
                kind: q.kind,
                difficulty: q.difficulty,
                content: q.content,
                options,
                correct_option_id: q.correct_option_id,
                short_answer: q.short_answer,
                explanation: q.explanation,
            }
        })
        .collect();

    for question in &questions {
        if let Err(e) = question.validate() {
            warn!("{}", e);
        }
    }

    Ok(questions)
}

/// Topic list from the topic analysis call; anything unparseable yields no topics.
pub fn parse_topics(text: &str) -> Vec<String> {
    serde_json::from_str(&clean_json_text(text)).unwrap_or_else(|e| {
        warn!("failed to parse topics JSON: {}", e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const BATCH: &str = r#"[
        {"content": "Tính <math>\\frac{1}{2} + \\frac{1}{2}</math>", "type": "MCQ", "difficulty": "Nhận biết",
         "options": [{"id": "A", "content": "1"}, {"id": "B", "content": "2"}],
         "correctOptionId": "A", "explanation": "Cộng hai phân số."},
        {"content": "Giải <math>x + 1 = 3</math>", "type": "SHORT_ANSWER", "difficulty": "Thông hiểu",
         "shortAnswer": "2", "explanation": "x = 2"}
    ]"#;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn cleans_code_fences() {
        assert_eq!(clean_json_text("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(clean_json_text("  ```JSON [] ``` "), "[]");
        assert_eq!(clean_json_text("```\n{}\n```"), "{}");
        assert_eq!(clean_json_text("[\"a\"]"), "[\"a\"]");
    }

    #[test]
    fn fenced_and_bare_batches_parse_alike() {
        let fenced = format!("```json\n{}\n```", BATCH);
        let a = parse_questions(BATCH, &mut rng()).unwrap();
        let b = parse_questions(&fenced, &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn keeps_content_and_decodes_escaped_backslashes() {
        let questions = parse_questions(BATCH, &mut rng()).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(
            questions[0].content,
            r"Tính <math>\frac{1}{2} + \frac{1}{2}</math>"
        );
        assert_eq!(questions[0].options[0].id, "A");
        assert_eq!(questions[0].correct_option_index(), Some(0));
        assert_eq!(questions[1].kind, QuestionType::ShortAnswer);
        assert!(questions[1].options.is_empty());
        assert_eq!(questions[1].short_answer.as_deref(), Some("2"));
    }

    #[test]
    fn assigns_unique_ids_without_reordering() {
        let text = r#"[
            {"content": "c1", "type": "MCQ", "difficulty": "x", "explanation": "e",
             "options": [{"content": "o1"}, {"content": "o2"}, {"id": "", "content": "o3"}]},
            {"content": "c2", "type": "TRUE_FALSE", "difficulty": "x", "explanation": "e",
             "options": [{"id": "T", "content": "Đúng"}, {"id": "T", "content": "Sai"}]}
        ]"#;
        let questions = parse_questions(text, &mut rng()).unwrap();

        let contents: Vec<&str> = questions.iter().map(|q| q.content.as_str()).collect();
        assert_eq!(contents, vec!["c1", "c2"]);
        assert_ne!(questions[0].id, questions[1].id);

        for q in &questions {
            assert!(!q.id.is_empty());
            let ids: HashSet<&str> = q.options.iter().map(|o| o.id.as_str()).collect();
            assert_eq!(ids.len(), q.options.len());
            assert!(ids.iter().all(|id| !id.is_empty()));
        }
        let option_text: Vec<&str> = questions[0].options.iter().map(|o| o.content.as_str()).collect();
        assert_eq!(option_text, vec!["o1", "o2", "o3"]);
        assert_eq!(questions[1].options[0].id, "T");
    }

    #[test]
    fn malformed_batch_is_rejected_whole() {
        let text = r#"[{"content": "ok", "type": "ESSAY", "explanation": "e"}, {"content": 3}]"#;
        assert!(matches!(
            parse_questions(text, &mut rng()),
            Err(GenerationError::MalformedData(_))
        ));
        assert!(matches!(
            parse_questions("Xin lỗi, tôi không thể", &mut rng()),
            Err(GenerationError::MalformedData(_))
        ));
        assert!(matches!(
            parse_questions("  ", &mut rng()),
            Err(GenerationError::EmptyResponse)
        ));
    }

    #[test]
    fn unknown_question_type_is_malformed() {
        let text = r#"[{"content": "c", "type": "MATCHING", "explanation": "e"}]"#;
        assert!(parse_questions(text, &mut rng()).is_err());
    }

    #[test]
    fn topics_parse_or_come_back_empty() {
        assert_eq!(
            parse_topics("```json\n[\"Tập hợp con\", \"Phép giao\"]\n```"),
            vec!["Tập hợp con", "Phép giao"]
        );
        assert!(parse_topics("not json").is_empty());
    }
}
