//! Language-specific tree-sitter configurations.
//!
//! Each language module provides:
//! - A structure query tagging functions, classes, loops, branches and handlers
//! - Factory function for creating parsers, listed in [`builtin`]

use crate::parser::ParserFactory;
use crate::record::Language;

#[cfg(feature = "tree-sitter")]
pub mod python;

/// Built-in parser factories, one per language with a grammar.
pub fn builtin() -> Vec<(Language, ParserFactory)> {
    vec![(Language::Python, python::new_parser as ParserFactory)]
}
