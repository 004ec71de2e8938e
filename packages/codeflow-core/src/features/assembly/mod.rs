//! Diagram assembly
//!
//! Parses model-produced fragments into a local IR, then merges them
//! into a single deterministic graph with chunk subgraphs, call
//! splices, and Start/End framing.

pub mod assembler;
pub mod fragment_parser;
pub mod graph;

pub use assembler::{assemble, ChunkMeta};
pub use fragment_parser::{parse_fragment, FragmentIr};
pub use graph::{DiagramEdge, DiagramGraph, DiagramNode, NodeShape};
