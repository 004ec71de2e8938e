//! Chunking
//!
//! Greedy source-order bin-packing of function records into
//! model-context-sized batches. Source order preserves locality
//! between calling and called functions, which is what lets the model
//! infer cross-function edges without a call graph.

mod chunker;

pub use chunker::{build_chunks, estimate_tokens, Chunk};
