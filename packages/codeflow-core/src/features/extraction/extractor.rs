//! Grammar-aware function extraction
//!
//! Depth-first walk over the syntax tree emitting one
//! [`FunctionRecord`] per definition node, in source order. Nested
//! definitions keep a parent back-reference but stay inside the
//! parent's span; the chunker decides granularity later.

use tree_sitter::Node;

use crate::features::detection::Language;
use crate::features::parsing::{node_span, node_text, SyntaxTree};
use crate::shared::models::{FlowHints, FunctionRecord, RecordId, SourceDocument};

use super::rules::{is_builtin_call, rules_for, ExtractionRules};

/// Nesting guard matching the deepest structure worth charting
const MAX_DEPTH: usize = 64;

/// Extract callable units from a parsed document
///
/// Returns zero records, not an error, when the document defines no
/// functions; the chunker treats that case as one synthetic unit.
pub fn extract(doc: &SourceDocument, tree: &SyntaxTree) -> Vec<FunctionRecord> {
    let Some(rules) = rules_for(doc.language) else {
        return Vec::new();
    };

    let mut walker = Walker {
        doc,
        rules,
        language: doc.language,
        records: Vec::new(),
        anon_counter: 0,
    };
    walker.walk(&tree.root(), None, 0);

    tracing::debug!(
        language = doc.language.name(),
        count = walker.records.len(),
        "extracted function records"
    );
    walker.records
}

struct Walker<'a> {
    doc: &'a SourceDocument,
    rules: &'static ExtractionRules,
    language: Language,
    records: Vec<FunctionRecord>,
    anon_counter: u32,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: &Node, parent: Option<RecordId>, depth: usize) {
        if depth > MAX_DEPTH {
            return;
        }

        let mut current_parent = parent;
        if self.rules.definition_kinds.contains(&node.kind()) {
            let id = self.records.len() as RecordId;
            let mut record = FunctionRecord::new(
                id,
                self.definition_name(node),
                node_span(node),
                node_text(node, &self.doc.text),
            )
            .with_hints(self.hints(node));
            record.parent_id = parent;
            self.records.push(record);
            current_parent = Some(id);
        }

        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                if child.is_named() {
                    self.walk(&child, current_parent, depth + 1);
                }
            }
        }
    }

    /// Declared name, name through an enclosing binding, or a
    /// synthesized `{lang}_anon_{n}` so no record is ever nameless
    fn definition_name(&mut self, node: &Node) -> String {
        if let Some(name) = node.child_by_field_name("name") {
            return node_text(&name, &self.doc.text).to_string();
        }

        // C puts the name behind the declarator chain
        if let Some(name) = self.c_declarator_name(node) {
            return name;
        }

        // Anonymous units bound to a name: const f = () => ..., x.f = function ...
        if self.rules.anonymous_kinds.contains(&node.kind()) {
            if let Some(name) = binding_name(node, &self.doc.text) {
                return name;
            }
        }

        self.anon_counter += 1;
        format!("{}_anon_{}", self.language.name(), self.anon_counter)
    }

    fn c_declarator_name(&self, node: &Node) -> Option<String> {
        let mut declarator = node.child_by_field_name("declarator")?;
        // Unwrap pointer/function declarator nesting down to the identifier
        loop {
            if declarator.kind() == "identifier" {
                return Some(node_text(&declarator, &self.doc.text).to_string());
            }
            declarator = declarator.child_by_field_name("declarator")?;
        }
    }

    fn hints(&self, node: &Node) -> FlowHints {
        let mut hints = FlowHints {
            complexity: 1,
            ..Default::default()
        };
        self.scan(node, node, &mut hints);
        hints.calls.dedup();
        hints
    }

    fn scan(&self, root: &Node, node: &Node, hints: &mut FlowHints) {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            let kind = child.kind();

            // Do not attribute a nested definition's flow to this record
            if !std::ptr::eq(root, node) && self.rules.definition_kinds.contains(&kind) {
                continue;
            }

            if self.rules.loop_kinds.contains(&kind) {
                hints.has_loops = true;
            }
            if self.rules.conditional_kinds.contains(&kind) {
                hints.has_conditionals = true;
            }
            if self.rules.branch_kinds.contains(&kind) {
                hints.complexity += 1;
            }
            if self.rules.call_kinds.contains(&kind) {
                if let Some(callee) = child.child_by_field_name("function") {
                    let name = node_text(&callee, &self.doc.text).to_string();
                    if !name.is_empty() && !is_builtin_call(&name) && !hints.calls.contains(&name) {
                        hints.calls.push(name);
                    }
                }
            }

            self.scan(root, &child, hints);
        }
    }
}

/// Name of the binding an anonymous function is assigned to, if any
fn binding_name(node: &Node, source: &str) -> Option<String> {
    let parent = node.parent()?;
    match parent.kind() {
        "variable_declarator" => parent
            .child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string()),
        "assignment_expression" | "assignment" => parent
            .child_by_field_name("left")
            .map(|n| node_text(&n, source).to_string()),
        "pair" => parent
            .child_by_field_name("key")
            .map(|n| node_text(&n, source).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::SyntaxIndexer;
    use pretty_assertions::assert_eq;

    fn extract_from(text: &str, language: Language) -> Vec<FunctionRecord> {
        let doc = SourceDocument::new(text, None, language);
        let tree = SyntaxIndexer::parse(&doc).unwrap();
        extract(&doc, &tree)
    }

    #[test]
    fn test_python_two_functions_in_order() {
        let records = extract_from("def a(): pass\ndef b(): a()\n", Language::Python);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(records[1].hints.calls, vec!["a".to_string()]);
    }

    #[test]
    fn test_nested_function_gets_parent_link() {
        let source = "def outer():\n    def inner():\n        pass\n    inner()\n";
        let records = extract_from(source, Language::Python);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "outer");
        assert_eq!(records[1].name, "inner");
        assert_eq!(records[1].parent_id, Some(records[0].id));
        assert!(records[0].span.contains(&records[1].span));
    }

    #[test]
    fn test_anonymous_lambda_is_synthesized() {
        let records = extract_from("f = sorted(xs, key=lambda x: x)\n", Language::Python);
        assert_eq!(records.len(), 1);
        assert!(records[0].name.starts_with("python_anon_"));
    }

    #[test]
    fn test_js_arrow_bound_to_const_keeps_binding_name() {
        let records = extract_from("const add = (a, b) => a + b;\n", Language::JavaScript);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "add");
    }

    #[test]
    fn test_c_function_name_through_declarator() {
        let records = extract_from("int main(void) {\n    return 0;\n}\n", Language::C);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "main");
    }

    #[test]
    fn test_loop_and_conditional_hints() {
        let source = "def f(n):\n    for i in range(n):\n        if i % 2 == 0:\n            g(i)\n";
        let records = extract_from(source, Language::Python);
        let hints = &records[0].hints;
        assert!(hints.has_loops);
        assert!(hints.has_conditionals);
        assert!(hints.calls.contains(&"g".to_string()));
        // base 1 + for + if
        assert_eq!(hints.complexity, 3);
    }

    #[test]
    fn test_builtin_calls_filtered() {
        let records = extract_from("def f():\n    print(len(x))\n", Language::Python);
        assert!(records[0].hints.calls.is_empty());
    }

    #[test]
    fn test_script_only_document_yields_no_records() {
        let records = extract_from("x = 1\ny = x + 2\n", Language::Python);
        assert!(records.is_empty());
    }

    #[test]
    fn test_sibling_spans_do_not_overlap() {
        let records = extract_from("def a(): pass\ndef b(): pass\ndef c(): pass\n", Language::Python);
        for pair in records.windows(2) {
            assert!(!pair[0].span.overlaps(&pair[1].span));
        }
    }
}
