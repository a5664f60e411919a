//! Word-compatible HTML export of shuffled exam variants.

use crate::model::{ExamExportConfig, Question, QuestionType};
use crate::render::escape_html;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static MATH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<math>(.*?)</math>").expect("math tag regex"));

const BOM: &str = "\u{feff}";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write exam file: {0}")]
    Io(#[from] std::io::Error),

    #[error("at least one variant is required")]
    NoVariants,
}

/// `<math>X</math>` becomes ` $ X $ `, the inline math convention of the target editor.
pub fn convert_math_tags(html: &str) -> String {
    MATH_TAG.replace_all(html, " $$ ${1} $$ ").into_owned()
}

pub fn variant_code(index: u32) -> String {
    format!("10{}", index + 1)
}

fn option_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Shuffled copy of the questions; multiple choice options are shuffled too.
pub fn shuffle_variant<R: Rng>(questions: &[Question], rng: &mut R) -> Vec<Question> {
    let mut variant = questions.to_vec();
    variant.shuffle(rng);
    for question in variant.iter_mut() {
        if question.kind == QuestionType::Mcq {
            question.options.shuffle(rng);
        }
    }
    variant
}

fn answer_key(question: &Question) -> String {
    if question.kind.has_options() {
        return question
            .correct_option_index()
            .map(|i| option_label(i).to_string())
            .unwrap_or_else(|| String::from("-"));
    }
    match question.short_answer.as_deref() {
        Some(answer) if !answer.is_empty() => convert_math_tags(answer),
        _ => String::from("-"),
    }
}

pub fn exam_html(
    questions: &[Question],
    code: &str,
    config: &ExamExportConfig,
    theory: Option<&str>,
) -> String {
    let mut body = format!(
        r#"<div class="header" style="text-align: center; margin-bottom: 20px;">
  <p style="font-weight: bold; font-size: 13pt; margin: 0;">{}</p>
  <p style="font-weight: bold; font-size: 16pt; margin: 10px 0;">{}</p>
  <p>Mã đề: <b>{}</b></p>
</div>
<hr/>
"#,
        escape_html(&config.school_name.to_uppercase()),
        escape_html(&config.exam_title.to_uppercase()),
        code
    );

    if let Some(theory) = theory.filter(|t| !t.trim().is_empty()) {
        body.push_str(&format!(
            r#"<div class="section-theory" style="margin-bottom: 25px;">
  <h3 style="text-transform: uppercase; border-bottom: 1px solid black; padding-bottom: 5px;">I. TÓM TẮT LÝ THUYẾT TRỌNG TÂM</h3>
  <div style="font-size: 12pt; text-align: justify; line-height: 1.4;">{}</div>
</div>
<h3 style="text-transform: uppercase; border-bottom: 1px solid black; padding-bottom: 5px; margin-top: 20px;">II. BÀI TẬP TỰ LUYỆN</h3>
"#,
            convert_math_tags(theory)
        ));
    }

    body.push_str(r#"<div class="content">"#);
    for (index, question) in questions.iter().enumerate() {
        body.push_str(r#"<div style="margin-bottom: 15px;">"#);
        body.push_str(&format!(
            "<p><b>Câu {}:</b> {}</p>",
            index + 1,
            convert_math_tags(&question.content)
        ));
        match question.kind {
            QuestionType::Mcq | QuestionType::TrueFalse => {
                body.push_str(r#"<div style="margin-left: 20px;">"#);
                for (i, option) in question.options.iter().enumerate() {
                    body.push_str(&format!(
                        r#"<p style="margin: 5px 0;"><b>{}.</b> {}</p>"#,
                        option_label(i),
                        convert_math_tags(&option.content)
                    ));
                }
                body.push_str("</div>");
            }
            QuestionType::ShortAnswer => body.push_str(
                "<p><i>Trả lời: ..............................................................</i></p>",
            ),
            QuestionType::Essay => body.push_str(
                "<p><i>(Học sinh trình bày lời giải chi tiết vào giấy làm bài)</i></p>",
            ),
        }
        body.push_str("</div>");
    }
    body.push_str("</div>\n");

    // answer key starts on a new page
    body.push_str(r#"<br clear="all" style="page-break-before:always" />"#);
    body.push_str(&format!(
        r#"<h2 style="text-align: center;">ĐÁP ÁN VÀ HƯỚNG DẪN GIẢI CHI TIẾT (MÃ {})</h2>"#,
        code
    ));
    body.push_str(r#"<h3 style="margin-top:20px">1. Bảng đáp án nhanh</h3>"#);
    body.push_str(r#"<table border="1" style="border-collapse: collapse; width: 100%; margin-bottom: 20px; text-align: center;"><tr>"#);
    for index in 0..questions.len() {
        body.push_str(&format!(
            r#"<th style="padding: 5px; background-color: #f0f0f0;">{}</th>"#,
            index + 1
        ));
    }
    body.push_str("</tr><tr>");
    for question in questions {
        body.push_str(&format!(
            r#"<td style="padding: 5px;">{}</td>"#,
            answer_key(question)
        ));
    }
    body.push_str("</tr></table>\n");

    body.push_str(r#"<h3 style="margin-top:20px">2. Lời giải chi tiết</h3>"#);
    for (index, question) in questions.iter().enumerate() {
        let difficulty = question
            .difficulty
            .as_deref()
            .map(|d| format!(r#"<span style="color: #666; font-size: 0.9em;"> [{}]</span>"#, escape_html(d)))
            .unwrap_or_default();
        body.push_str(&format!(
            r#"<div style="margin-bottom: 10px;"><p><b>Câu {}:</b>{} {}</p></div>"#,
            index + 1,
            difficulty,
            convert_math_tags(&question.explanation)
        ));
    }

    format!(
        r#"<html xmlns:o='urn:schemas-microsoft-com:office:office' xmlns:w='urn:schemas-microsoft-com:office:word' xmlns='http://www.w3.org/TR/REC-html40'>
<head>
  <meta charset="utf-8">
  <title>{}</title>
  <style>
    body {{ font-family: 'Times New Roman', serif; font-size: 12pt; line-height: 1.5; }}
    table, th, td {{ border: 1px solid black; }}
    h3 {{ font-size: 14pt; color: #333; }}
    ul {{ list-style-type: disc; margin-left: 20px; }}
    li {{ margin-bottom: 5px; }}
  </style>
</head>
<body>{}</body>
</html>
"#,
        escape_html(&config.exam_title),
        body
    )
}

pub fn variant_file_name(config: &ExamExportConfig, code: &str) -> String {
    let mut slugger = github_slugger::Slugger::default();
    format!("Tai_Lieu_{}_Ma_{}.doc", slugger.slug(&config.exam_title), code)
}

/// Writes one document per variant into `output_dir`, each with its own shuffle.
pub fn write_variants<R: Rng>(
    questions: &[Question],
    config: &ExamExportConfig,
    theory: Option<&str>,
    output_dir: &Path,
    rng: &mut R,
) -> Result<Vec<PathBuf>, ExportError> {
    if config.number_of_variants == 0 {
        return Err(ExportError::NoVariants);
    }

    let mut written = Vec::with_capacity(config.number_of_variants as usize);
    for index in 0..config.number_of_variants {
        let code = variant_code(index);
        let variant = shuffle_variant(questions, rng);
        let html = exam_html(&variant, &code, config, theory);

        let path = output_dir.join(variant_file_name(config, &code));
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)?;
        write!(file, "{}{}", BOM, html)?;

        info!("wrote variant {} to {}", code, path.display());
        written.push(path);
    }
    Ok(written)
}
