use chrono::{Local, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const IMAGE_EXAM_TITLE: &str = "Đề thi từ Ảnh";
const ID_LEN: usize = 9;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
    ShortAnswer,
    Essay,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::Mcq,
        QuestionType::TrueFalse,
        QuestionType::ShortAnswer,
        QuestionType::Essay,
    ];

    /// wire name, as used in prompts and in the response schema enum
    pub fn code(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::TrueFalse => "TRUE_FALSE",
            QuestionType::ShortAnswer => "SHORT_ANSWER",
            QuestionType::Essay => "ESSAY",
        }
    }

    /// answered by picking one of the question's options
    pub fn has_options(&self) -> bool {
        matches!(self, QuestionType::Mcq | QuestionType::TrueFalse)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Requested overall difficulty of a generated set.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[serde(rename = "NB")]
    Recognition,
    #[default]
    #[serde(rename = "TH")]
    Understanding,
    #[serde(rename = "VD")]
    Application,
    #[serde(rename = "VDC")]
    AdvancedApplication,
    #[serde(rename = "MIXED")]
    Mixed,
}

impl Difficulty {
    pub fn prompt_phrase(&self) -> &'static str {
        match self {
            Difficulty::Recognition => "Mức độ Nhận biết (Dễ)",
            Difficulty::Understanding => "Mức độ Thông hiểu (Trung bình)",
            Difficulty::Application => "Mức độ Vận dụng (Khá)",
            Difficulty::AdvancedApplication => "Mức độ Vận dụng cao (Khó - Tư duy tổng hợp)",
            Difficulty::Mixed => "Hỗn hợp các mức độ từ Nhận biết đến Vận dụng cao",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QuestionOption {
    pub id: String,
    /// may contain `<math>` segments
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: QuestionType,

    /// per-question level assigned by the model, free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,

    pub content: String,

    #[serde(default)]
    pub options: Vec<QuestionOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_answer: Option<String>,

    pub explanation: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum QuestionError {
    #[error("question {id} has no correct option among its {count} options")]
    MissingCorrectOption { id: String, count: usize },

    #[error("short answer question {id} has no expected answer")]
    MissingShortAnswer { id: String },
}

impl Question {
    pub fn correct_option_index(&self) -> Option<usize> {
        let correct = self.correct_option_id.as_deref()?;
        self.options.iter().position(|o| o.id == correct)
    }

    /// Checks the answer invariants of the question type.
    pub fn validate(&self) -> Result<(), QuestionError> {
        match self.kind {
            QuestionType::Mcq | QuestionType::TrueFalse => {
                if self.correct_option_index().is_none() {
                    return Err(QuestionError::MissingCorrectOption {
                        id: self.id.clone(),
                        count: self.options.len(),
                    });
                }
            }
            QuestionType::ShortAnswer => {
                let present = self
                    .short_answer
                    .as_deref()
                    .is_some_and(|a| !a.trim().is_empty());
                if !present {
                    return Err(QuestionError::MissingShortAnswer {
                        id: self.id.clone(),
                    });
                }
            }
            QuestionType::Essay => {}
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub grade: String,
    pub lesson: String,
    pub topics: Vec<String>,
    pub difficulty: Difficulty,
    pub question_types: Vec<QuestionType>,
    pub quantity: u32,
    pub model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grade: String::from("11"),
            lesson: String::new(),
            topics: Vec::new(),
            difficulty: Difficulty::default(),
            question_types: vec![QuestionType::Mcq],
            quantity: 10,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamExportConfig {
    /// number of shuffled variants (exam codes) to produce
    pub number_of_variants: u32,
    pub exam_title: String,
    pub school_name: String,
}

impl Default for ExamExportConfig {
    fn default() -> Self {
        Self {
            number_of_variants: 4,
            exam_title: String::from("Đề kiểm tra"),
            school_name: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedExam {
    pub id: String,
    pub title: String,
    /// creation time, epoch milliseconds
    pub timestamp: i64,
    pub questions: Vec<Question>,
    pub config: AppConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_config: Option<ExamExportConfig>,
}

impl SavedExam {
    /// Snapshots a question set, titled after the lesson (or the image source) and today's date.
    pub fn new(questions: Vec<Question>, config: AppConfig, from_image: bool) -> Self {
        let timestamp = Utc::now().timestamp_millis();
        let source = if from_image || config.lesson.is_empty() {
            IMAGE_EXAM_TITLE
        } else {
            config.lesson.as_str()
        };
        let title = format!("{} - {}", source, Local::now().format("%d/%m/%Y"));

        Self {
            id: timestamp.to_string(),
            title,
            timestamp,
            questions,
            config,
            export_config: None,
        }
    }
}

/// Hands out short random ids, never repeating one it has already issued or been told about.
#[derive(Debug, Default)]
pub struct IdGenerator {
    issued: HashSet<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an externally supplied id as taken. Returns false if it was already taken.
    pub fn reserve(&mut self, id: &str) -> bool {
        self.issued.insert(id.to_string())
    }

    pub fn next_id<R: Rng>(&mut self, rng: &mut R) -> String {
        loop {
            let id: String = (0..ID_LEN)
                .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
                .collect();
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}
