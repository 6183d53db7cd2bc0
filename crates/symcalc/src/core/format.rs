//! Display formatting for engine output
//!
//! Rewrites `a/b` into `\frac{a}{b}` so MathJax renders a fraction.

use regex::Regex;
use std::sync::OnceLock;

/// An operand is a run of word characters (which covers decimals once
/// dots are allowed) or a parenthesized group without nesting.
const DIVISION_PATTERN: &str = r"(\([^()]*\)|[\w.]+)\s*/\s*(\([^()]*\)|[\w.]+)";

fn division_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DIVISION_PATTERN).expect("division pattern compiles"))
}

/// Converts every `left / right` into `\frac{left}{right}`.
///
/// Matches are substituted left to right without overlap, so a chain
/// like `a/b/c` becomes `\frac{a}{b}/c`. Input that is not well-formed
/// math passes through with whatever partial substitution applies.
#[must_use]
pub fn format_expression(expr: &str) -> String {
    division_regex()
        .replace_all(expr, r"\frac{${1}}{${2}}")
        .into_owned()
}
