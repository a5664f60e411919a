//! Recovery of LaTeX commands mangled by JSON string escapes.
//!
//! When a model writes `"\frac{1}{2}"` inside a JSON string instead of
//! `"\\frac{1}{2}"`, the decoder turns `\f` into a form feed and the command
//! is lost. [`repair_latex`] maps each such control character back to the
//! two-character escape that produced it. It does not look at context: a
//! genuine tab or newline inside a formula is rewritten too.

/// Control characters a JSON decoder produces from `\f`, `\t`, `\b`, `\r`, `\n`.
const ESCAPES: [(char, &str); 5] = [
    ('\u{000c}', "\\f"),
    ('\t', "\\t"),
    ('\u{0008}', "\\b"),
    ('\r', "\\r"),
    ('\n', "\\n"),
];

fn escape_for(c: char) -> Option<&'static str> {
    ESCAPES
        .iter()
        .find(|(control, _)| *control == c)
        .map(|(_, escape)| *escape)
}

pub fn repair_latex(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match escape_for(c) {
            Some(escape) => out.push_str(escape),
            None => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recovers_frac_from_form_feed() {
        assert_eq!(repair_latex("\u{000c}rac{1}{2}"), "\\frac{1}{2}");
    }

    #[test]
    fn recovers_each_control_character() {
        assert_eq!(repair_latex("\times"), "\\times");
        assert_eq!(repair_latex("\u{0008}eta"), "\\beta");
        assert_eq!(repair_latex("\right)"), "\\right)");
        assert_eq!(repair_latex("a \neq b"), "a \\neq b");
    }

    #[test]
    fn leaves_other_text_alone() {
        let text = "x^{2} + \\sqrt{3} - ≤ đáp án";
        assert_eq!(repair_latex(text), text);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let once = repair_latex("\u{000c}rac{\theta}{2}\r\n");
        assert_eq!(repair_latex(&once), once);
    }
}
