//! Code signals: language detection, structural complexity and line counts.
//!
//! Language detection is a best-effort lexical heuristic. The rules live in an
//! ordered table so precedence is inspectable and testable; the first rule
//! that matches wins.

use tracing::debug;

use crate::parser;
use crate::record::Language;

/// Divisor normalizing the weighted structure sum into [0,1].
pub const COMPLEXITY_SATURATION: f64 = 50.0;

/// Non-empty line count at which the line-based estimate saturates.
pub const LINE_SATURATION: f64 = 100.0;

/// A lexical matcher over raw source text.
#[derive(Debug, Clone, Copy)]
pub enum LexicalRule {
    /// Matches when any of the markers is present.
    AnyOf(&'static [&'static str]),
    /// Matches when `marker` is present together with any of `with`.
    AllWith {
        marker: &'static str,
        with: &'static [&'static str],
    },
}

impl LexicalRule {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            LexicalRule::AnyOf(markers) => markers.iter().any(|m| text.contains(m)),
            LexicalRule::AllWith { marker, with } => {
                text.contains(marker) && with.iter().any(|m| text.contains(m))
            }
        }
    }
}

/// Ordered language detection rules.
pub static LANGUAGE_RULES: &[(Language, LexicalRule)] = &[
    (
        Language::Python,
        LexicalRule::AnyOf(&["import ", "def ", "class "]),
    ),
    (
        Language::JavaScript,
        LexicalRule::AllWith {
            marker: "function",
            with: &["{", "=>"],
        },
    ),
    (
        Language::Java,
        LexicalRule::AnyOf(&["public class", "private "]),
    ),
    (Language::Cpp, LexicalRule::AnyOf(&["#include", "int main"])),
];

/// Detect the language of a snippet. Returns `Language::Unknown` when no rule
/// matches.
pub fn detect_language(text: &str) -> Language {
    LANGUAGE_RULES
        .iter()
        .find(|(_, rule)| rule.matches(text))
        .map(|(language, _)| *language)
        .unwrap_or(Language::Unknown)
}

/// Complexity score in [0,1].
///
/// Uses structural parsing when a parser is registered for the language and
/// the snippet parses cleanly, otherwise the non-empty line count.
pub fn calculate_complexity(text: &str, language: Language) -> f64 {
    let Some(parser) = parser::for_language(language) else {
        return line_complexity(text);
    };

    match parser.structure(text.as_bytes()) {
        Ok(counts) => (counts.weighted() / COMPLEXITY_SATURATION).min(1.0),
        Err(e) => {
            debug!(%language, error = %e, "structural parse failed, using line count");
            line_complexity(text)
        }
    }
}

/// Line-count fallback estimate.
fn line_complexity(text: &str) -> f64 {
    (count_lines(text) as f64 / LINE_SATURATION).min(1.0)
}

/// Count lines containing at least one non-whitespace character.
pub fn count_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}
