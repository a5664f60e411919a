//! Timed exam simulation: scoring and per-difficulty analytics.

use crate::model::{Question, QuestionType};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Time allowed per question, in seconds.
pub const SECONDS_PER_QUESTION: u64 = 90;
const UNKNOWN_DIFFICULTY: &str = "Khác";

pub fn time_limit(question_count: usize) -> u64 {
    question_count as u64 * SECONDS_PER_QUESTION
}

/// `MM:SS`
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Whether `answer` (an option id, or the typed text for short answers) is correct.
/// Essays are never auto-scored.
pub fn is_correct(question: &Question, answer: Option<&str>) -> bool {
    let Some(answer) = answer else {
        return false;
    };
    match question.kind {
        QuestionType::Mcq | QuestionType::TrueFalse => {
            question.correct_option_id.as_deref() == Some(answer)
        }
        QuestionType::ShortAnswer => question
            .short_answer
            .as_deref()
            .is_some_and(|expected| normalize(expected) == normalize(answer)),
        QuestionType::Essay => false,
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DifficultyStats {
    pub total: u32,
    pub correct: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub score: u32,
    pub total: usize,
    /// keyed by the question's difficulty label
    pub stats: BTreeMap<String, DifficultyStats>,
    pub elapsed_seconds: u64,
}

impl SimulationReport {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / self.total as f64
    }
}

/// Answers are keyed by question id.
pub fn score(
    questions: &[Question],
    answers: &HashMap<String, String>,
    elapsed_seconds: u64,
) -> SimulationReport {
    let mut stats: BTreeMap<String, DifficultyStats> = BTreeMap::new();
    let mut correct_count = 0;

    for question in questions {
        let label = question
            .difficulty
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| UNKNOWN_DIFFICULTY.to_string());
        let entry = stats.entry(label).or_default();
        entry.total += 1;

        if is_correct(question, answers.get(&question.id).map(String::as_str)) {
            correct_count += 1;
            entry.correct += 1;
        }
    }

    SimulationReport {
        score: correct_count,
        total: questions.len(),
        stats,
        elapsed_seconds,
    }
}
