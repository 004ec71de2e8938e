//! Tree-sitter based syntax indexer

use tree_sitter::{Parser as TsParser, Tree};

use crate::errors::{FlowError, Result};
use crate::features::detection::Language;
use crate::shared::models::{SourceDocument, Span};

use super::node_utils::node_span;

/// A parse error or missing-token site in a best-effort tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub span: Span,
    pub message: String,
}

/// Concrete syntax tree for one document
///
/// Owned by the indexer's caller for the duration of a single run;
/// never shared across runs (a stale tree over mutated text violates
/// the span invariants everywhere downstream).
#[derive(Debug)]
pub struct SyntaxTree {
    tree: Tree,
    pub language: Language,
    pub issues: Vec<ParseIssue>,
}

impl SyntaxTree {
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Grammar-driven parser front end
pub struct SyntaxIndexer;

impl SyntaxIndexer {
    /// Resolve the tree-sitter grammar for a language
    fn grammar(language: Language) -> Result<tree_sitter::Language> {
        match language {
            Language::Python => Ok(tree_sitter_python::language()),
            Language::JavaScript => Ok(tree_sitter_javascript::language()),
            Language::C => Ok(tree_sitter_c::language()),
            Language::Unknown => Err(FlowError::parse_unavailable(
                "unknown",
                "no grammar for undetected language",
            )),
        }
    }

    /// Parse a document with a resolved (non-unknown) language tag
    ///
    /// Deterministic for identical input text and grammar version. A
    /// malformed document still returns a tree; ERROR and MISSING nodes
    /// are collected as issues so the caller can report `ParsePartial`.
    pub fn parse(doc: &SourceDocument) -> Result<SyntaxTree> {
        let grammar = Self::grammar(doc.language)?;

        let mut parser = TsParser::new();
        parser.set_language(&grammar).map_err(|e| {
            FlowError::parse_unavailable(doc.language.name(), e.to_string())
        })?;

        let tree = parser.parse(&doc.text, None).ok_or_else(|| {
            // parse() returns None only on cancellation or a missing
            // language, both of which mean the grammar is unusable here
            FlowError::parse_unavailable(doc.language.name(), "parser returned no tree")
        })?;

        let mut issues = Vec::new();
        collect_issues(&tree.root_node(), &mut issues);

        if !issues.is_empty() {
            tracing::warn!(
                language = doc.language.name(),
                issue_count = issues.len(),
                "best-effort parse with errors"
            );
        }

        Ok(SyntaxTree {
            tree,
            language: doc.language,
            issues,
        })
    }
}

fn collect_issues(node: &tree_sitter::Node, issues: &mut Vec<ParseIssue>) {
    if node.is_error() || node.is_missing() {
        issues.push(ParseIssue {
            span: node_span(node),
            message: if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "syntax error".to_string()
            },
        });
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_issues(&child, issues);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str, language: Language) -> SourceDocument {
        SourceDocument::new(text, None, language)
    }

    #[test]
    fn test_parse_python_clean() {
        let tree = SyntaxIndexer::parse(&doc("def hello():\n    pass\n", Language::Python)).unwrap();
        assert!(!tree.has_issues());
        assert_eq!(tree.root().kind(), "module");
    }

    #[test]
    fn test_parse_javascript_clean() {
        let tree =
            SyntaxIndexer::parse(&doc("function f() { return 1; }", Language::JavaScript)).unwrap();
        assert!(!tree.has_issues());
    }

    #[test]
    fn test_parse_c_clean() {
        let tree = SyntaxIndexer::parse(&doc("int main(void) { return 0; }", Language::C)).unwrap();
        assert!(!tree.has_issues());
    }

    #[test]
    fn test_malformed_input_still_returns_tree() {
        let tree = SyntaxIndexer::parse(&doc("def broken(:\n    pass\n", Language::Python)).unwrap();
        assert!(tree.has_issues());
    }

    #[test]
    fn test_unknown_language_is_parse_unavailable() {
        let err = SyntaxIndexer::parse(&doc("whatever", Language::Unknown)).unwrap_err();
        assert!(matches!(err, FlowError::ParseUnavailable { .. }));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "def a():\n    if x:\n        return 1\n";
        let t1 = SyntaxIndexer::parse(&doc(source, Language::Python)).unwrap();
        let t2 = SyntaxIndexer::parse(&doc(source, Language::Python)).unwrap();
        assert_eq!(t1.root().to_sexp(), t2.root().to_sexp());
    }
}
