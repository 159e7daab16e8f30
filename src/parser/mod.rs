//! Structural parsing interface for code complexity signals.
//!
//! This module provides:
//! - `Parser` trait: Abstract interface for language parsers
//! - A registry mapping detected languages to parser factories
//! - Tree-sitter implementations for the languages that support it

use std::collections::HashMap;
use std::sync::RwLock;

use crate::record::Language;

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

#[cfg(feature = "tree-sitter")]
pub mod languages;

/// Weight of each structural indicator in the complexity sum.
pub mod weights {
    pub const FUNCTION: f64 = 2.0;
    pub const CLASS: f64 = 3.0;
    pub const LOOP: f64 = 1.5;
    pub const BRANCH: f64 = 1.0;
    pub const HANDLER: f64 = 2.0;
}

/// Counts of structural indicators found in a parsed snippet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureCounts {
    /// Function definitions
    pub functions: usize,
    /// Class / type definitions
    pub classes: usize,
    /// `for` and `while` loops
    pub loops: usize,
    /// Conditional branches, each `elif` counted separately
    pub branches: usize,
    /// Exception-handling blocks
    pub handlers: usize,
}

impl StructureCounts {
    /// Weighted sum of all indicators (unnormalized).
    pub fn weighted(&self) -> f64 {
        self.functions as f64 * weights::FUNCTION
            + self.classes as f64 * weights::CLASS
            + self.loops as f64 * weights::LOOP
            + self.branches as f64 * weights::BRANCH
            + self.handlers as f64 * weights::HANDLER
    }
}

/// Parser trait for extracting structural indicators from source code.
pub trait Parser: Send + Sync {
    /// Count structural indicators in the source.
    ///
    /// Returns an error when the source does not parse cleanly; callers fall
    /// back to a line-based estimate.
    fn structure(&self, source: &[u8]) -> anyhow::Result<StructureCounts>;

    /// Return the language this parser handles.
    fn language(&self) -> Language;
}

/// Factory function type for creating parser instances.
pub type ParserFactory = fn() -> Box<dyn Parser>;

lazy_static::lazy_static! {
    /// Global parser registry mapping languages to parser factories, seeded
    /// with the built-in parsers on first use.
    static ref REGISTRY: RwLock<HashMap<Language, ParserFactory>> =
        RwLock::new(builtin_parsers());
}

#[cfg(feature = "tree-sitter")]
fn builtin_parsers() -> HashMap<Language, ParserFactory> {
    languages::builtin().into_iter().collect()
}

#[cfg(not(feature = "tree-sitter"))]
fn builtin_parsers() -> HashMap<Language, ParserFactory> {
    HashMap::new()
}

/// Register a parser factory for a language.
pub fn register(language: Language, factory: ParserFactory) {
    let mut registry = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
    registry.insert(language, factory);
}

/// Get a parser for the given language.
/// Returns None if the language has no structural parser.
pub fn for_language(language: Language) -> Option<Box<dyn Parser>> {
    let registry = REGISTRY.read().unwrap_or_else(|e| e.into_inner());
    registry.get(&language).map(|factory| factory())
}

/// Return all languages with a registered parser.
pub fn supported_languages() -> Vec<Language> {
    let registry = REGISTRY.read().unwrap_or_else(|e| e.into_inner());
    registry.keys().copied().collect()
}

/// Build the parser registry eagerly.
///
/// Lookups seed the registry on their own; this only moves the cost to
/// startup.
pub fn init() {
    lazy_static::initialize(&REGISTRY);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "tree-sitter")]
    #[test]
    fn test_registry_seeded_with_builtin_parsers() {
        let parser = for_language(Language::Python).unwrap();
        assert_eq!(parser.language(), Language::Python);
        assert!(supported_languages().contains(&Language::Python));

        // re-registering the same factory leaves lookups unchanged
        register(Language::Python, languages::python::new_parser);
        let counts = for_language(Language::Python)
            .unwrap()
            .structure(b"def f():\n    pass\n")
            .unwrap();
        assert_eq!(counts.functions, 1);
    }

    #[test]
    fn test_languages_without_grammar() {
        for language in [
            Language::JavaScript,
            Language::Java,
            Language::Cpp,
            Language::Unknown,
        ] {
            assert!(for_language(language).is_none(), "{}", language);
            assert!(!supported_languages().contains(&language));
        }
    }

    #[test]
    fn test_weighted_sum() {
        let counts = StructureCounts {
            functions: 3,
            classes: 1,
            loops: 2,
            branches: 4,
            handlers: 1,
        };
        // 6 + 3 + 3 + 4 + 2
        assert_eq!(counts.weighted(), 18.0);
        assert_eq!(StructureCounts::default().weighted(), 0.0);
    }
}
