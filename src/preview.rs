use crate::model::{Question, QuestionType};
use crate::render::{escape_html, render_block, render_inline, FormulaRenderer};

const STYLE: &str = r#"body { font-family: sans-serif; max-width: 860px; margin: 2em auto; line-height: 1.6; }
.question { border-bottom: 1px solid #e2e8f0; padding: 1em 0; }
.difficulty { color: #64748b; font-size: 0.85em; }
.correct { font-weight: bold; color: #15803d; }
.math { display: inline-block; vertical-align: middle; padding: 0 2px; }
.math-error { color: #ef4444; font-family: monospace; background: #fef2f2; padding: 2px; }"#;

fn question_html(index: usize, question: &Question, renderer: &dyn FormulaRenderer) -> String {
    let mut html = String::from(r#"<div class="question">"#);

    let difficulty = question
        .difficulty
        .as_deref()
        .map(|d| format!(r#" <span class="difficulty">[{}]</span>"#, escape_html(d)))
        .unwrap_or_default();
    html.push_str(&format!(
        "<h3>Câu {} · {}{}</h3>",
        index + 1,
        question.kind,
        difficulty
    ));
    html.push_str(&render_block(&question.content, renderer));

    if !question.options.is_empty() {
        html.push_str("<ol type=\"A\">");
        for option in &question.options {
            let class = if question.correct_option_id.as_deref() == Some(option.id.as_str()) {
                r#" class="correct""#
            } else {
                ""
            };
            html.push_str(&format!(
                "<li{}>{}</li>",
                class,
                render_inline(&option.content, renderer)
            ));
        }
        html.push_str("</ol>");
    }

    if question.kind == QuestionType::ShortAnswer {
        if let Some(answer) = &question.short_answer {
            html.push_str(&format!(
                r#"<p class="correct">Đáp án: {}</p>"#,
                render_inline(answer, renderer)
            ));
        }
    }

    html.push_str("<details><summary>Lời giải</summary>");
    html.push_str(&render_block(&question.explanation, renderer));
    html.push_str("</details></div>\n");
    html
}

/// Standalone page showing a question set with every formula typeset.
pub fn preview_html(title: &str, questions: &[Question], renderer: &dyn FormulaRenderer) -> String {
    let body: String = questions
        .iter()
        .enumerate()
        .map(|(i, q)| question_html(i, q, renderer))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
{STYLE}
</style>
</head>
<body>
<h1>{title}</h1>
{body}</body>
</html>
"#,
        title = escape_html(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionOption;
    use crate::render::RenderError;

    struct Upper;

    impl FormulaRenderer for Upper {
        fn render(&self, latex: &str) -> Result<String, RenderError> {
            if latex.is_empty() {
                return Err(RenderError(String::from("empty formula")));
            }
            Ok(latex.to_uppercase())
        }
    }

    #[test]
    fn marks_correct_option_and_renders_formulas() {
        let question = Question {
            id: String::from("q"),
            kind: QuestionType::Mcq,
            difficulty: Some(String::from("Thông hiểu")),
            content: String::from("Nghiệm của <math>x - 1 = 0</math>"),
            options: vec![
                QuestionOption { id: String::from("a"), content: String::from("<math>x = 1</math>") },
                QuestionOption { id: String::from("b"), content: String::from("<math></math>") },
            ],
            correct_option_id: Some(String::from("a")),
            short_answer: None,
            explanation: String::from("Chuyển vế."),
        };

        let html = preview_html("Bài <1>", &[question], &Upper);
        assert!(html.contains("<title>Bài &lt;1&gt;</title>"));
        assert!(html.contains("Câu 1 · MCQ"));
        assert!(html.contains("[Thông hiểu]"));
        assert!(html.contains("X - 1 = 0"));
        assert!(html.contains(r#"<li class="correct"><span class="math-text"><span class="math">X = 1</span></span></li>"#));
        assert!(html.contains(r#"<span class="math-error"></span>"#));
        assert!(html.contains("Chuyển vế."));
    }
}
