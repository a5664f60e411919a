use crate::model::{AppConfig, ExamExportConfig};
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Reads a generation request from YAML. Fields left out keep their defaults.
pub fn load_app_config(path: &Path) -> anyhow::Result<AppConfig> {
    let raw = fs::read_to_string(path)
        .context(format!("failed to read config file {}", path.display()))?;
    parse_app_config(&raw).context(format!("invalid config file {}", path.display()))
}

pub fn parse_app_config(raw: &str) -> anyhow::Result<AppConfig> {
    let config: AppConfig = serde_yaml_ng::from_str(raw)?;
    if config.lesson.trim().is_empty() {
        anyhow::bail!("lesson must be set");
    }
    if config.question_types.is_empty() {
        anyhow::bail!("at least one question type is required");
    }
    Ok(config)
}

pub fn parse_export_config(raw: &str) -> anyhow::Result<ExamExportConfig> {
    Ok(serde_yaml_ng::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuestionType};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_yaml_with_defaults() {
        let config = parse_app_config(
            r#"
grade: "12"
lesson: "Bài 1. Tính đơn điệu và cực trị của hàm số"
difficulty: VDC
questionTypes: [MCQ, SHORT_ANSWER]
quantity: 5
"#,
        )
        .unwrap();

        assert_eq!(config.grade, "12");
        assert_eq!(config.difficulty, Difficulty::AdvancedApplication);
        assert_eq!(
            config.question_types,
            vec![QuestionType::Mcq, QuestionType::ShortAnswer]
        );
        assert_eq!(config.quantity, 5);
        assert!(config.topics.is_empty());
        assert_eq!(config.model, "gemini-3-flash-preview");
    }

    #[test]
    fn rejects_missing_lesson_or_types() {
        assert!(parse_app_config("grade: \"10\"").is_err());
        assert!(parse_app_config("lesson: x\nquestionTypes: []").is_err());
        assert!(parse_app_config("lesson: x\ndifficulty: HARD").is_err());
    }

    #[test]
    fn export_config_defaults() {
        let config = parse_export_config("schoolName: THPT Lê Quý Đôn").unwrap();
        assert_eq!(config.number_of_variants, 4);
        assert_eq!(config.school_name, "THPT Lê Quý Đôn");
    }
}
