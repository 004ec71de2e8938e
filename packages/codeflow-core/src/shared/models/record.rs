//! Callable-unit records
//!
//! Extracted functions live in a flat arena addressed by `RecordId`,
//! with nesting expressed as parent-id back-references instead of an
//! owning tree. A child's text is a subset of its parent's text; both
//! are kept so the chunker can pick its own granularity.

use serde::{Deserialize, Serialize};

use super::Span;

/// Monotonic per-run record identifier
pub type RecordId = u32;

/// Control-flow hints gathered during extraction
///
/// These never gate anything; they only enrich the prompt context so
/// the model draws loop back-edges and decision diamonds where the
/// source actually has them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowHints {
    pub has_loops: bool,
    pub has_conditionals: bool,
    /// Outgoing call names, builtins filtered out
    pub calls: Vec<String>,
    /// Cyclomatic complexity estimate (branch keyword count + 1)
    pub complexity: u32,
}

/// One extracted callable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub id: RecordId,
    /// Declared name, or a synthesized `{lang}_anon_{n}` for anonymous units
    pub name: String,
    pub span: Span,
    /// Enclosing definition, if nested
    pub parent_id: Option<RecordId>,
    /// Raw source text of the definition
    pub text: String,
    pub hints: FlowHints,
    /// True for the whole-document unit the chunker synthesizes when a
    /// document has no definitions at all
    pub synthetic: bool,
}

impl FunctionRecord {
    pub fn new(id: RecordId, name: impl Into<String>, span: Span, text: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            span,
            parent_id: None,
            text: text.into(),
            hints: FlowHints::default(),
            synthetic: false,
        }
    }

    pub fn with_parent(mut self, parent_id: RecordId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_hints(mut self, hints: FlowHints) -> Self {
        self.hints = hints;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let rec = FunctionRecord::new(0, "foo", Span::new(0, 10, 1, 1), "def foo(): pass")
            .with_hints(FlowHints {
                has_loops: true,
                ..Default::default()
            });
        assert_eq!(rec.id, 0);
        assert_eq!(rec.name, "foo");
        assert!(rec.parent_id.is_none());
        assert!(rec.hints.has_loops);
        assert!(!rec.synthetic);
    }

    #[test]
    fn test_record_parent_link() {
        let child = FunctionRecord::new(1, "inner", Span::zero(), "").with_parent(0);
        assert_eq!(child.parent_id, Some(0));
    }
}
