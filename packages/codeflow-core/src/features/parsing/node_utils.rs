//! Tree-sitter node helpers shared by parsing and extraction

use tree_sitter::Node;

use crate::shared::models::Span;

/// Extract text content from a node
#[inline]
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Convert a tree-sitter node to a Span (byte offsets + 1-indexed lines)
#[inline]
pub fn node_span(node: &Node) -> Span {
    Span::new(
        node.start_byte(),
        node.end_byte(),
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse_python(code: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::language())
            .unwrap();
        parser.parse(code, None).unwrap()
    }

    #[test]
    fn test_node_text() {
        let code = "def foo(): pass";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        assert_eq!(node_text(&func, code), code);
    }

    #[test]
    fn test_node_span_lines() {
        let code = "def foo():\n    pass";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let span = node_span(&func);
        assert_eq!(span.start_line, 1);
        assert_eq!(span.end_line, 2);
        assert_eq!(span.start_byte, 0);
        assert_eq!(span.end_byte, code.len());
    }
}
