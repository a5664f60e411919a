//! Rendering of question text that mixes markup with `<math>…</math>` formulas.

mod mathml;

pub use mathml::MathMlRenderer;

use crate::latex::repair_latex;
use log::warn;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const MATH_OPEN: &str = "<math>";
pub const MATH_CLOSE: &str = "</math>";

// non-greedy so adjacent formulas stay separate; (?s) keeps formulas whose `\n` was decoded
static MATH_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<math>(.*?)</math>").expect("math segment regex"));

#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to render formula: {0}")]
pub struct RenderError(pub String);

/// A typesetting backend turning one inline LaTeX formula into markup.
pub trait FormulaRenderer {
    fn render(&self, latex: &str) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    /// trusted markup, passed through untouched
    Text(&'a str),
    /// repaired LaTeX source of one formula
    Math(String),
}

/// Splits content into literal and formula segments. Empty literal runs are dropped.
pub fn split_segments(content: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in MATH_SEGMENT.captures_iter(content) {
        let (Some(whole), Some(latex)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text(&content[last..whole.start()]));
        }
        segments.push(Segment::Math(repair_latex(latex.as_str())));
        last = whole.end();
    }

    if last < content.len() {
        segments.push(Segment::Text(&content[last..]));
    }
    segments
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Markup(String),
    Formula(String),
    /// formula the backend rejected, kept as source so the breakage is visible
    Fallback { source: String, error: RenderError },
}

impl Rendered {
    pub fn to_html(&self) -> String {
        match self {
            Rendered::Markup(markup) => markup.clone(),
            Rendered::Formula(markup) => format!(r#"<span class="math">{}</span>"#, markup),
            Rendered::Fallback { source, .. } => {
                format!(r#"<span class="math-error">{}</span>"#, escape_html(source))
            }
        }
    }
}

/// Renders every segment of `content`; a formula that fails to render degrades to a
/// fallback segment and the remaining segments are still rendered.
pub fn render_segments(content: &str, renderer: &dyn FormulaRenderer) -> Vec<Rendered> {
    split_segments(content)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => Rendered::Markup(text.to_string()),
            Segment::Math(latex) => match renderer.render(&latex) {
                Ok(markup) => Rendered::Formula(markup),
                Err(error) => {
                    warn!("{} (source: {:?})", error, latex);
                    Rendered::Fallback {
                        source: latex,
                        error,
                    }
                }
            },
        })
        .collect()
}

/// Inline rendering, suitable inside a sentence.
pub fn render_inline(content: &str, renderer: &dyn FormulaRenderer) -> String {
    let body: String = render_segments(content, renderer)
        .iter()
        .map(Rendered::to_html)
        .collect();
    format!(r#"<span class="math-text">{}</span>"#, body)
}

/// Block rendering. Formulas are still typeset inline; only the container changes.
pub fn render_block(content: &str, renderer: &dyn FormulaRenderer) -> String {
    let body: String = render_segments(content, renderer)
        .iter()
        .map(Rendered::to_html)
        .collect();
    format!(r#"<div class="math-text block">{}</div>"#, body)
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
