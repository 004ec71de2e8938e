//! Fragment notation parser
//!
//! Line-based parser for the mermaid-flowchart subset the prompt asks
//! the model to emit: shaped node declarations, arrow edges with
//! optional pipe labels, and `%% entry:` / `%% exit:` linking
//! directives. Anything else is skipped, not an error; a fragment
//! yielding zero nodes is reported as unparseable.

use once_cell::sync::Lazy;
use regex::Regex;

use super::graph::NodeShape;

/// Arrow operators, longest first so prefixes never shadow
const ARROWS: [&str; 4] = ["-.->", "==>", "-->", "---"];

/// Shape bracket pairs, longest first
const SHAPES: [(&str, &str, NodeShape); 5] = [
    ("([", "])", NodeShape::Terminal),
    ("[/", "/]", NodeShape::Loop),
    ("((", "))", NodeShape::Round),
    ("[", "]", NodeShape::Process),
    ("{", "}", NodeShape::Decision),
];

static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A node as declared inside one fragment, before re-keying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEdge {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

/// Parsed fragment contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentIr {
    /// Declaration order; the first node is the fragment's entry point
    pub nodes: Vec<LocalNode>,
    pub edges: Vec<LocalEdge>,
    /// Function name from the `%% entry:` directive
    pub entry_label: Option<String>,
    /// Function names from `%% exit:` directives
    pub exit_labels: Vec<String>,
}

impl FragmentIr {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn declare(&mut self, node: LocalNode) {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id == node.id) {
            // A later shaped declaration refines an earlier bare reference
            if existing.label == existing.id && node.label != node.id {
                existing.label = node.label;
                existing.shape = node.shape;
            }
            return;
        }
        self.nodes.push(node);
    }
}

/// Parse one fragment's notation text
pub fn parse_fragment(text: &str) -> FragmentIr {
    let mut ir = FragmentIr::default();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty()
            || line.starts_with("graph ")
            || line.starts_with("flowchart ")
            || line.starts_with("subgraph")
            || line == "end"
            || line.starts_with("style ")
            || line.starts_with("classDef ")
            || line.starts_with("linkStyle ")
        {
            continue;
        }

        if let Some(rest) = line.strip_prefix("%%") {
            let rest = rest.trim();
            if let Some(name) = rest.strip_prefix("entry:") {
                ir.entry_label = Some(name.trim().to_string());
            } else if let Some(name) = rest.strip_prefix("exit:") {
                let name = name.trim().to_string();
                if !name.is_empty() && !ir.exit_labels.contains(&name) {
                    ir.exit_labels.push(name);
                }
            }
            continue;
        }

        parse_statement(line, &mut ir);
    }

    ir
}

/// One statement: a node declaration or an arrow chain
/// `a[X] --> b{Y?} -->|No| c`
fn parse_statement(line: &str, ir: &mut FragmentIr) {
    let mut rest = line;
    let mut previous: Option<String> = None;

    loop {
        let arrow_hit = ARROWS
            .iter()
            .filter_map(|a| rest.find(a).map(|pos| (pos, *a)))
            .min_by_key(|(pos, _)| *pos);

        let (segment, after) = match arrow_hit {
            Some((pos, arrow)) => (&rest[..pos], Some(&rest[pos + arrow.len()..])),
            None => (rest, None),
        };

        let (label, node_text) = split_edge_label(segment);
        if let Some(node) = parse_node_token(node_text) {
            if let Some(src) = previous.take() {
                ir.edges.push(LocalEdge {
                    source: src,
                    target: node.id.clone(),
                    label,
                });
            }
            previous = Some(node.id.clone());
            ir.declare(node);
        } else if !node_text.trim().is_empty() {
            // Unrecognized token breaks the chain
            previous = None;
        }

        match after {
            Some(next) => rest = next,
            None => break,
        }
    }
}

/// Pull a leading `|label|` off an edge's right-hand segment
fn split_edge_label(segment: &str) -> (Option<String>, &str) {
    let trimmed = segment.trim_start();
    if let Some(after_open) = trimmed.strip_prefix('|') {
        if let Some(close) = after_open.find('|') {
            let label = after_open[..close].trim().to_string();
            let rest = &after_open[close + 1..];
            return (Some(label).filter(|l| !l.is_empty()), rest);
        }
    }
    (None, segment)
}

/// `id`, `id[label]`, `id([label])`, `id{label}`, `id[/label/]`, `id((label))`
fn parse_node_token(token: &str) -> Option<LocalNode> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let bracket_pos = token.find(|c| "([{".contains(c));
    let (id, shape_part) = match bracket_pos {
        Some(pos) => (&token[..pos], &token[pos..]),
        None => (token, ""),
    };
    let id = id.trim();
    if !ID_RE.is_match(id) {
        return None;
    }

    if shape_part.is_empty() {
        return Some(LocalNode {
            id: id.to_string(),
            label: id.to_string(),
            shape: NodeShape::Process,
        });
    }

    for (open, close, shape) in SHAPES {
        if let Some(inner) = shape_part.strip_prefix(open) {
            if let Some(label) = inner.strip_suffix(close) {
                let label = label.trim().trim_matches('"').to_string();
                return Some(LocalNode {
                    id: id.to_string(),
                    label: if label.is_empty() { id.to_string() } else { label },
                    shape,
                });
            }
        }
    }
    None
}
