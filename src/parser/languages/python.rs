//! Python language configuration for tree-sitter parsing.

use crate::parser::treesitter::{Config, TreeSitterParser};
use crate::parser::Parser;
use crate::record::Language;

/// Tree-sitter query tagging Python structural indicators.
///
/// Counts:
/// - function definitions (including methods and decorated functions)
/// - class definitions
/// - for / while loops
/// - if statements and each elif clause
/// - try statements
///
/// Python 2 `print` and `exec` statements make the snippet unparseable.
const STRUCTURE_QUERY: &str = r#"
(function_definition) @function
(class_definition) @class
(for_statement) @loop
(while_statement) @loop
(if_statement) @branch
(elif_clause) @branch
(try_statement) @handler
(print_statement) @rejected
(exec_statement) @rejected
"#;

/// Async definitions and loops, and `try` blocks with `except*` groups, are
/// distinct constructs and are not counted.
const EXCLUDED_CHILDREN: &[&str] = &["async", "except_group_clause"];

/// Create a new Python parser.
pub fn new_parser() -> Box<dyn Parser> {
    Box::new(TreeSitterParser::new(Config {
        grammar: tree_sitter_python::LANGUAGE.into(),
        language: Language::Python,
        structure_query: STRUCTURE_QUERY,
        excluded_children: EXCLUDED_CHILDREN,
    }))
}
