//! Syntax indexing
//!
//! Builds a concrete syntax tree for a detected language with
//! tree-sitter. Parsing is error-tolerant: malformed input still yields
//! a best-effort tree and a list of [`ParseIssue`]s, and only a grammar
//! that cannot be loaded at all is a hard failure.

mod indexer;
mod node_utils;

pub use indexer::{ParseIssue, SyntaxIndexer, SyntaxTree};
pub use node_utils::{node_span, node_text};
