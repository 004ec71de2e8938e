//! Assembled diagram graph
//!
//! Flat node/edge tables with string ids. All collections are vecs in
//! insertion order, so serialization is byte-identical across runs on
//! the same input.

use serde::{Deserialize, Serialize};

use crate::shared::models::RecordId;

/// Mermaid node shapes the notation vocabulary allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeShape {
    /// `id([label])`
    Terminal,
    /// `id[label]`
    Process,
    /// `id{label}`
    Decision,
    /// `id[/label/]`
    Loop,
    /// `id((label))`
    Round,
}

impl NodeShape {
    pub fn brackets(&self) -> (&'static str, &'static str) {
        match self {
            NodeShape::Terminal => ("([", "])"),
            NodeShape::Process => ("[", "]"),
            NodeShape::Decision => ("{", "}"),
            NodeShape::Loop => ("[/", "/]"),
            NodeShape::Round => ("((", "))"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    /// Originating chunk; None for the framing Start/End nodes
    pub chunk_index: Option<usize>,
    /// Originating function record, where known
    pub record_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

/// The merged diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramGraph {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    /// Subgraph title per chunk index
    pub chunk_titles: Vec<String>,
    pub direction: String,
}

impl DiagramGraph {
    pub fn new(direction: impl Into<String>, chunk_titles: Vec<String>) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            chunk_titles,
            direction: direction.into(),
        }
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Insert a node unless its id already exists (first declaration
    /// wins; a later one may only fill in a missing label)
    pub fn add_node(&mut self, node: DiagramNode) {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id == node.id) {
            if existing.label == existing.id && node.label != node.id {
                existing.label = node.label;
                existing.shape = node.shape;
            }
            return;
        }
        self.nodes.push(node);
    }

    /// Insert an edge, deduplicating identical (source, target, label)
    /// triples introduced by overlapping fragment context
    pub fn add_edge(&mut self, edge: DiagramEdge) {
        if self.edges.contains(&edge) {
            return;
        }
        self.edges.push(edge);
    }

    /// True when some edge runs from chunk `from` into chunk `to`
    pub fn connects_chunks(&self, from: usize, to: usize) -> bool {
        self.edges.iter().any(|e| {
            self.chunk_of(&e.source) == Some(from) && self.chunk_of(&e.target) == Some(to)
        })
    }

    fn chunk_of(&self, id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.chunk_index)
    }

    pub fn nodes_in_chunk(&self, chunk_index: usize) -> impl Iterator<Item = &DiagramNode> {
        self.nodes
            .iter()
            .filter(move |n| n.chunk_index == Some(chunk_index))
    }

    /// Render as mermaid text. Deterministic: identical graphs yield
    /// byte-identical output.
    pub fn to_mermaid(&self) -> String {
        let mut out = format!("graph {}\n", self.direction);

        for node in self.nodes.iter().filter(|n| n.chunk_index.is_none()) {
            out.push_str(&format!("    {}\n", render_node(node)));
        }

        for (index, title) in self.chunk_titles.iter().enumerate() {
            let members: Vec<&DiagramNode> = self.nodes_in_chunk(index).collect();
            if members.is_empty() {
                continue;
            }
            out.push_str(&format!("    subgraph chunk{}[\"{}\"]\n", index, escape(title)));
            for node in members {
                out.push_str(&format!("        {}\n", render_node(node)));
            }
            out.push_str("    end\n");
        }

        for edge in &self.edges {
            match &edge.label {
                Some(label) => out.push_str(&format!(
                    "    {} -->|{}| {}\n",
                    edge.source,
                    escape(label),
                    edge.target
                )),
                None => out.push_str(&format!("    {} --> {}\n", edge.source, edge.target)),
            }
        }

        out
    }
}

fn render_node(node: &DiagramNode) -> String {
    let (open, close) = node.shape.brackets();
    format!("{}{}\"{}\"{}", node.id, open, escape(&node.label), close)
}

fn escape(text: &str) -> String {
    text.replace('"', "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str, label: &str, chunk: Option<usize>) -> DiagramNode {
        DiagramNode {
            id: id.to_string(),
            label: label.to_string(),
            shape: NodeShape::Process,
            chunk_index: chunk,
            record_id: None,
        }
    }

    #[test]
    fn test_duplicate_node_ids_keep_first_declaration() {
        let mut graph = DiagramGraph::new("TD", vec!["f".into()]);
        graph.add_node(node("c0_1", "first", Some(0)));
        graph.add_node(node("c0_1", "second", Some(0)));
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].label, "first");
    }

    #[test]
    fn test_duplicate_edges_deduplicated() {
        let mut graph = DiagramGraph::new("TD", vec!["f".into()]);
        graph.add_node(node("a", "a", Some(0)));
        graph.add_node(node("b", "b", Some(0)));
        let edge = DiagramEdge {
            source: "a".into(),
            target: "b".into(),
            label: None,
        };
        graph.add_edge(edge.clone());
        graph.add_edge(edge);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_to_mermaid_groups_by_chunk() {
        let mut graph = DiagramGraph::new("TD", vec!["alpha".into(), "beta".into()]);
        graph.add_node(node("c0_1", "step", Some(0)));
        graph.add_node(node("c1_1", "other", Some(1)));
        graph.add_edge(DiagramEdge {
            source: "c0_1".into(),
            target: "c1_1".into(),
            label: Some("calls beta".into()),
        });
        let text = graph.to_mermaid();
        assert!(text.starts_with("graph TD\n"));
        assert!(text.contains("subgraph chunk0[\"alpha\"]"));
        assert!(text.contains("subgraph chunk1[\"beta\"]"));
        assert!(text.contains("c0_1 -->|calls beta| c1_1"));
    }

    #[test]
    fn test_to_mermaid_is_deterministic() {
        let build = || {
            let mut graph = DiagramGraph::new("TD", vec!["f".into()]);
            graph.add_node(node("c0_1", "x", Some(0)));
            graph.add_node(node("c0_2", "y", Some(0)));
            graph.add_edge(DiagramEdge {
                source: "c0_1".into(),
                target: "c0_2".into(),
                label: None,
            });
            graph.to_mermaid()
        };
        assert_eq!(build(), build());
    }
}
