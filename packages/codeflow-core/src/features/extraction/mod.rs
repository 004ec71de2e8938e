//! Function extraction
//!
//! Produces the ordered, flat record arena the chunker consumes. The
//! grammar-aware path walks a tree-sitter tree with a per-language
//! rules table; unknown languages take the regex-based generic path.

mod extractor;
mod generic;
mod rules;

pub use extractor::extract;
pub use generic::extract_generic;
pub(crate) use generic::text_hints;
pub use rules::{is_builtin_call, rules_for, ExtractionRules};
