//! Math exam generation over the Gemini API: prompting and parsing, LaTeX repair and
//! rendering, the exam bank, and Word-compatible export.

pub mod config;
pub mod export;
pub mod gemini;
pub mod latex;
pub mod model;
pub mod presentation;
pub mod preview;
pub mod render;
pub mod session;
pub mod simulation;
pub mod store;

pub use gemini::{GenerationClient, GenerationError};
pub use model::{AppConfig, Difficulty, ExamExportConfig, Question, QuestionOption, QuestionType, SavedExam};
