//! Exam bank: every saved exam in one JSON file, rewritten whole on each change.

use crate::model::SavedExam;
use log::{debug, error};
use serde_json::Value;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BANK_PATH_VAR: &str = "EXAMGEN_BANK";
pub const DEFAULT_BANK_FILE: &str = "math_app_exam_bank_v1.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access exam bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode exam: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File không đúng định dạng đề thi Math Pro: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone)]
pub struct ExamBank {
    path: PathBuf,
}

impl ExamBank {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Bank at `$EXAMGEN_BANK`, or the default file in the working directory.
    pub fn from_env() -> Self {
        Self::new(env::var(BANK_PATH_VAR).unwrap_or_else(|_| DEFAULT_BANK_FILE.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole bank. A missing file is an empty bank.
    pub fn try_load(&self) -> Result<Vec<SavedExam>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`ExamBank::try_load`], but an unreadable bank is logged and treated as empty.
    pub fn load(&self) -> Vec<SavedExam> {
        self.try_load().unwrap_or_else(|e| {
            error!("failed to load exams from {}: {}", self.path.display(), e);
            Vec::new()
        })
    }

    pub fn get(&self, id: &str) -> Option<SavedExam> {
        self.load().into_iter().find(|e| e.id == id)
    }

    /// Replaces the exam with the same id in place, or puts a new one first.
    /// An unreadable bank is an error and is left untouched.
    pub fn save(&self, exam: &SavedExam) -> Result<(), StoreError> {
        let mut exams = self.try_load()?;
        match exams.iter_mut().find(|e| e.id == exam.id) {
            Some(existing) => *existing = exam.clone(),
            None => exams.insert(0, exam.clone()),
        }
        self.write_all(&exams)
    }

    /// Removes an exam; returns whether it was present.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut exams = self.try_load()?;
        let before = exams.len();
        exams.retain(|e| e.id != id);
        let removed = exams.len() != before;
        self.write_all(&exams)?;
        Ok(removed)
    }

    fn write_all(&self, exams: &[SavedExam]) -> Result<(), StoreError> {
        let content = serde_json::to_string(exams)?;
        fs::write(&self.path, content)?;
        debug!("wrote {} exams to {}", exams.len(), self.path.display());
        Ok(())
    }
}

pub fn export_file_name(exam: &SavedExam) -> String {
    format!("MathPro_Exam_{}.json", exam.id)
}

/// Writes one exam, pretty printed, into `output_dir`.
pub fn export_json(exam: &SavedExam, output_dir: &Path) -> Result<PathBuf, StoreError> {
    let path = output_dir.join(export_file_name(exam));
    fs::write(&path, serde_json::to_string_pretty(exam)?)?;
    Ok(path)
}

/// Parses an exported exam. The id must be present and `questions` must be an array.
pub fn parse_exam_json(raw: &str) -> Result<SavedExam, StoreError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| StoreError::InvalidFormat(e.to_string()))?;

    let has_id = match value.get("id") {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    };
    if !has_id {
        return Err(StoreError::InvalidFormat(String::from("missing exam id")));
    }
    if !value.get("questions").is_some_and(Value::is_array) {
        return Err(StoreError::InvalidFormat(String::from(
            "questions must be an array",
        )));
    }

    let mut value = value;
    // older exports may carry a numeric id
    if let Some(Value::Number(n)) = value.get("id").cloned() {
        value["id"] = Value::String(n.to_string());
    }

    serde_json::from_value(value).map_err(|e| StoreError::InvalidFormat(e.to_string()))
}

pub fn import_json(path: &Path) -> Result<SavedExam, StoreError> {
    let raw = fs::read_to_string(path)?;
    parse_exam_json(&raw)
}
