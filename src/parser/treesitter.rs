//! Tree-sitter based parser implementation.
//!
//! This module provides a generic tree-sitter parser that can be configured
//! for different languages via a single structure query.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language as TsLanguage, Parser as TsParser, Query, QueryCursor};

use super::{Parser, StructureCounts};
use crate::record::Language;

/// Capture names a structure query may use.
pub mod captures {
    pub const FUNCTION: &str = "function";
    pub const CLASS: &str = "class";
    pub const LOOP: &str = "loop";
    pub const BRANCH: &str = "branch";
    pub const HANDLER: &str = "handler";
    /// Constructs the grammar accepts but the language no longer does
    pub const REJECTED: &str = "rejected";
}

/// Configuration for a tree-sitter language parser.
#[derive(Clone)]
pub struct Config {
    /// The tree-sitter grammar
    pub grammar: TsLanguage,
    /// The language this grammar parses
    pub language: Language,
    /// Tree-sitter query tagging structural nodes with the names in [`captures`]
    pub structure_query: &'static str,
    /// Child node kinds that keep a captured node out of the counts
    pub excluded_children: &'static [&'static str],
}

/// Tree-sitter based parser.
pub struct TreeSitterParser {
    config: Config,
}

impl TreeSitterParser {
    /// Create a new tree-sitter parser with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parse source code and return the tree.
    fn parse(&self, source: &[u8]) -> anyhow::Result<tree_sitter::Tree> {
        let mut parser = TsParser::new();
        parser.set_language(&self.config.grammar)?;
        parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse source"))
    }
}

impl Parser for TreeSitterParser {
    fn structure(&self, source: &[u8]) -> anyhow::Result<StructureCounts> {
        let tree = self.parse(source)?;
        let root = tree.root_node();

        // Tree-sitter recovers from syntax errors; a tree containing ERROR or
        // MISSING nodes counts as a failed parse.
        if root.has_error() {
            anyhow::bail!("{} source has syntax errors", self.config.language);
        }

        let query = Query::new(&self.config.grammar, self.config.structure_query)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, root, source);

        let mut counts = StructureCounts::default();
        let mut walker = root.walk();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                if name == captures::REJECTED {
                    anyhow::bail!(
                        "{} source uses unsupported syntax: {}",
                        self.config.language,
                        capture.node.kind()
                    );
                }
                if capture
                    .node
                    .children(&mut walker)
                    .any(|child| self.config.excluded_children.contains(&child.kind()))
                {
                    continue;
                }
                match name {
                    captures::FUNCTION => counts.functions += 1,
                    captures::CLASS => counts.classes += 1,
                    captures::LOOP => counts.loops += 1,
                    captures::BRANCH => counts.branches += 1,
                    captures::HANDLER => counts.handlers += 1,
                    _ => {}
                }
            }
        }

        Ok(counts)
    }

    fn language(&self) -> Language {
        self.config.language
    }
}
