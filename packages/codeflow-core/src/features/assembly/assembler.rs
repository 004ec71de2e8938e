//! Fragment merging
//!
//! Consumes per-chunk fragments strictly in chunk order, re-keys local
//! node ids with a chunk prefix, splices entry/exit links by function
//! name, and frames the result with Start/End terminals. Given the
//! same ordered fragment sequence the output is byte-identical.

use crate::errors::Degradation;
use crate::shared::models::{DiagramFragment, RecordId};

use super::fragment_parser::parse_fragment;
use super::graph::{DiagramEdge, DiagramGraph, DiagramNode, NodeShape};

/// What assembly needs to know about one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMeta {
    pub index: usize,
    /// Lead function name; titles the chunk's subgraph
    pub title: String,
    /// All function names contained in the chunk, for exit-label matching
    pub function_names: Vec<String>,
    pub lead_record_id: RecordId,
}

/// Global id for a fragment-local node
fn rekey(chunk_index: usize, local_id: &str) -> String {
    format!("c{}_{}", chunk_index, local_id)
}

fn placeholder_id(chunk_index: usize) -> String {
    format!("c{}_unresolved", chunk_index)
}

/// Merge ordered fragments into one graph
///
/// `fragments` and `chunks` are parallel, ordered by chunk index; the
/// pipeline guarantees one fragment per chunk.
pub fn assemble(
    fragments: &[DiagramFragment],
    chunks: &[ChunkMeta],
    direction: &str,
) -> (DiagramGraph, Vec<Degradation>) {
    debug_assert_eq!(fragments.len(), chunks.len());

    let mut degradations = Vec::new();
    let mut graph = DiagramGraph::new(
        direction,
        chunks.iter().map(|c| c.title.clone()).collect(),
    );

    // Function name -> owning chunk (first declaration wins)
    let mut owners: Vec<(&str, usize)> = Vec::new();
    for chunk in chunks {
        for name in &chunk.function_names {
            if owners.iter().any(|(n, _)| n == name) {
                tracing::warn!(name = name.as_str(), "duplicate function name across chunks, keeping first");
                continue;
            }
            owners.push((name, chunk.index));
        }
    }
    let owner_of = |name: &str| owners.iter().find(|(n, _)| *n == name).map(|(_, i)| *i);

    let mut entry_nodes: Vec<String> = Vec::with_capacity(chunks.len());
    let mut last_nodes: Vec<String> = Vec::with_capacity(chunks.len());
    // (source chunk, called function name)
    let mut splices: Vec<(usize, String)> = Vec::new();

    for (fragment, chunk) in fragments.iter().zip(chunks.iter()) {
        let index = chunk.index;

        let ir = if fragment.parsed {
            parse_fragment(&fragment.text)
        } else {
            Default::default()
        };

        if ir.is_empty() {
            if fragment.parsed {
                degradations.push(Degradation::AssemblyInconsistent {
                    detail: format!("chunk {index} fragment yielded no nodes"),
                });
            }
            let id = placeholder_id(index);
            graph.add_node(DiagramNode {
                id: id.clone(),
                label: format!("Unresolved: {}", chunk.title),
                shape: NodeShape::Process,
                chunk_index: Some(index),
                record_id: Some(chunk.lead_record_id),
            });
            entry_nodes.push(id.clone());
            last_nodes.push(id);
            continue;
        }

        if let Some(entry) = &ir.entry_label {
            if !chunk.function_names.iter().any(|n| n == entry) {
                degradations.push(Degradation::AssemblyInconsistent {
                    detail: format!(
                        "chunk {index} fragment declares entry `{entry}` not in the chunk"
                    ),
                });
            }
        }

        for (pos, local) in ir.nodes.iter().enumerate() {
            graph.add_node(DiagramNode {
                id: rekey(index, &local.id),
                label: local.label.clone(),
                shape: local.shape,
                chunk_index: Some(index),
                record_id: (pos == 0).then_some(chunk.lead_record_id),
            });
        }

        for edge in &ir.edges {
            for endpoint in [&edge.source, &edge.target] {
                let id = rekey(index, endpoint);
                if !graph.has_node(&id) {
                    degradations.push(Degradation::AssemblyInconsistent {
                        detail: format!("chunk {index} edge references undeclared node {endpoint}"),
                    });
                    graph.add_node(DiagramNode {
                        id,
                        label: endpoint.clone(),
                        shape: NodeShape::Process,
                        chunk_index: Some(index),
                        record_id: None,
                    });
                }
            }
            graph.add_edge(DiagramEdge {
                source: rekey(index, &edge.source),
                target: rekey(index, &edge.target),
                label: edge.label.clone(),
            });
        }

        entry_nodes.push(rekey(index, &ir.nodes[0].id));
        last_nodes.push(rekey(index, &ir.nodes[ir.nodes.len() - 1].id));

        for name in &ir.exit_labels {
            splices.push((index, name.clone()));
        }
    }

    // Splice cross-chunk call edges by function-name correspondence
    for (source_chunk, name) in &splices {
        match owner_of(name) {
            Some(target_chunk) if target_chunk != *source_chunk => {
                graph.add_edge(DiagramEdge {
                    source: last_nodes[*source_chunk].clone(),
                    target: entry_nodes[target_chunk].clone(),
                    label: Some(format!("calls {name}")),
                });
            }
            Some(_) => {} // intra-chunk call, already drawn by the fragment
            None => degradations.push(Degradation::AssemblyInconsistent {
                detail: format!("exit label `{name}` matches no chunk"),
            }),
        }
    }

    // Frame the whole flow and keep consecutive chunks connected
    if !entry_nodes.is_empty() {
        graph.add_node(DiagramNode {
            id: "START".to_string(),
            label: "Start".to_string(),
            shape: NodeShape::Terminal,
            chunk_index: None,
            record_id: None,
        });
        graph.add_node(DiagramNode {
            id: "END".to_string(),
            label: "End".to_string(),
            shape: NodeShape::Terminal,
            chunk_index: None,
            record_id: None,
        });
        graph.add_edge(DiagramEdge {
            source: "START".to_string(),
            target: entry_nodes[0].clone(),
            label: None,
        });
        for i in 0..entry_nodes.len() - 1 {
            if !graph.connects_chunks(i, i + 1) {
                graph.add_edge(DiagramEdge {
                    source: last_nodes[i].clone(),
                    target: entry_nodes[i + 1].clone(),
                    label: None,
                });
            }
        }
        graph.add_edge(DiagramEdge {
            source: last_nodes[last_nodes.len() - 1].clone(),
            target: "END".to_string(),
            label: None,
        });
    }

    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        degraded = degradations.len(),
        "assembly complete"
    );

    (graph, degradations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta(index: usize, title: &str, names: &[&str]) -> ChunkMeta {
        ChunkMeta {
            index,
            title: title.to_string(),
            function_names: names.iter().map(|s| s.to_string()).collect(),
            lead_record_id: index as RecordId,
        }
    }

    fn fragment(index: usize, text: &str) -> DiagramFragment {
        DiagramFragment::new(index, text)
    }

    #[test]
    fn test_rekeying_avoids_cross_chunk_collisions() {
        let fragments = vec![
            fragment(0, "graph TD\n    a[First] --> b[Second]\n"),
            fragment(1, "graph TD\n    a[Other first] --> b[Other second]\n"),
        ];
        let chunks = vec![meta(0, "f", &["f"]), meta(1, "g", &["g"])];
        let (graph, degradations) = assemble(&fragments, &chunks, "TD");

        assert!(degradations.is_empty());
        assert!(graph.has_node("c0_a"));
        assert!(graph.has_node("c1_a"));
        assert_eq!(graph.nodes_in_chunk(0).count(), 2);
        assert_eq!(graph.nodes_in_chunk(1).count(), 2);
    }

    #[test]
    fn test_exit_label_splices_call_edge() {
        let fragments = vec![
            fragment(0, "graph TD\n%% entry: caller\n    a[Work] --> b[Call helper]\n%% exit: helper\n"),
            fragment(1, "graph TD\n%% entry: helper\n    a[Helper start] --> b[Helper end]\n"),
        ];
        let chunks = vec![meta(0, "caller", &["caller"]), meta(1, "helper", &["helper"])];
        let (graph, _) = assemble(&fragments, &chunks, "TD");

        assert!(graph.edges.iter().any(|e| {
            e.source == "c0_b" && e.target == "c1_a" && e.label.as_deref() == Some("calls helper")
        }));
        // The spliced edge connects the chunks, so no extra sequential edge
        assert_eq!(
            graph
                .edges
                .iter()
                .filter(|e| e.source.starts_with("c0_") && e.target.starts_with("c1_"))
                .count(),
            1
        );
    }

    #[test]
    fn test_failed_fragment_becomes_placeholder_node() {
        let fragments = vec![
            fragment(0, "graph TD\n    a[Ok]\n"),
            DiagramFragment::failed(1),
            fragment(2, "graph TD\n    a[Also ok]\n"),
        ];
        let chunks = vec![meta(0, "f", &["f"]), meta(1, "g", &["g"]), meta(2, "h", &["h"])];
        let (graph, _) = assemble(&fragments, &chunks, "TD");

        // One representational node per chunk
        for i in 0..3 {
            assert!(graph.nodes_in_chunk(i).count() >= 1);
        }
        let placeholder = graph.nodes.iter().find(|n| n.id == "c1_unresolved").unwrap();
        assert_eq!(placeholder.label, "Unresolved: g");
        // Sequential framing still runs through the placeholder
        assert!(graph.edges.iter().any(|e| e.target == "c1_unresolved"));
        assert!(graph.edges.iter().any(|e| e.source == "c1_unresolved"));
    }

    #[test]
    fn test_undeclared_edge_endpoint_inserted_with_degradation() {
        let fragments = vec![fragment(0, "graph TD\n    a[Here] --> ghost\n    a --> a2[More]\n")];
        let chunks = vec![meta(0, "f", &["f"])];
        let (graph, degradations) = assemble(&fragments, &chunks, "TD");

        // ghost was only referenced, never declared with a shape; it is
        // still materialized so edges reference existing ids only
        assert!(graph.has_node("c0_ghost"));
        for edge in &graph.edges {
            assert!(graph.has_node(&edge.source));
            assert!(graph.has_node(&edge.target));
        }
        assert!(degradations.is_empty() || degradations.iter().all(|d| matches!(d, Degradation::AssemblyInconsistent { .. })));
    }

    #[test]
    fn test_assembly_is_byte_identical_across_runs() {
        let fragments = vec![
            fragment(0, "graph TD\n    a[X] --> b{Y?}\n    b -->|Yes| c[Z]\n%% exit: g\n"),
            fragment(1, "graph TD\n    a[G work]\n"),
        ];
        let chunks = vec![meta(0, "f", &["f"]), meta(1, "g", &["g"])];
        let (g1, _) = assemble(&fragments, &chunks, "TD");
        let (g2, _) = assemble(&fragments, &chunks, "TD");
        assert_eq!(g1.to_mermaid(), g2.to_mermaid());
    }

    #[test]
    fn test_entry_directive_for_foreign_function_is_flagged() {
        let fragments = vec![fragment(0, "graph TD\n%% entry: stranger\n    a[Work]\n")];
        let chunks = vec![meta(0, "f", &["f"])];
        let (graph, degradations) = assemble(&fragments, &chunks, "TD");

        assert!(graph.has_node("c0_a"));
        assert!(degradations.iter().any(|d| matches!(
            d,
            Degradation::AssemblyInconsistent { detail } if detail.contains("stranger")
        )));
    }

    #[test]
    fn test_framing_start_and_end() {
        let fragments = vec![fragment(0, "graph TD\n    a[Only]\n")];
        let chunks = vec![meta(0, "f", &["f"])];
        let (graph, _) = assemble(&fragments, &chunks, "TD");

        assert!(graph.edges.iter().any(|e| e.source == "START" && e.target == "c0_a"));
        assert!(graph.edges.iter().any(|e| e.source == "c0_a" && e.target == "END"));
    }
}
