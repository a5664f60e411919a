use super::{FormulaRenderer, RenderError};
use latex2mathml::{latex_to_mathml, DisplayStyle};

/// Typesets formulas as MathML, always in inline style.
#[derive(Debug, Default, Clone, Copy)]
pub struct MathMlRenderer;

impl MathMlRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl FormulaRenderer for MathMlRenderer {
    fn render(&self, latex: &str) -> Result<String, RenderError> {
        latex_to_mathml(latex, DisplayStyle::Inline).map_err(|e| RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_inline;

    #[test]
    fn renders_inline_mathml() {
        let markup = MathMlRenderer::new().render("x^{2} + 1").unwrap();
        assert!(markup.contains("<math"));
        assert!(!markup.contains("display=\"block\""));
    }

    #[test]
    fn repaired_fraction_renders() {
        let html = render_inline("Tính <math>\u{000c}rac{1}{2}</math>", &MathMlRenderer);
        assert!(html.contains("<mfrac>"));
        assert!(!html.contains("math-error"));
    }
}
