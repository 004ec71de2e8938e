/*
 * Codeflow - Source-to-Flowchart Pipeline
 *
 * Feature-First Architecture:
 * - shared/      : Common models (SourceDocument, FunctionRecord, Span)
 * - features/    : Vertical slices (detection → parsing → extraction →
 *                  chunking → prompting → llm → assembly → rendering)
 * - pipeline/    : Orchestration
 */

#![allow(clippy::too_many_arguments)]
#![allow(clippy::collapsible_if)]

pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

pub use errors::{Degradation, FlowError, Result};
pub use features::assembly::{DiagramGraph, DiagramNode};
pub use features::detection::Language;
pub use features::llm::{HttpModelClient, ModelClient, ModelConfig, ModelError};
pub use features::rendering::{DiagramRenderer, MermaidInkRenderer};
pub use pipeline::{Pipeline, PipelineConfig, PipelineEvent, PipelineOutcome};
pub use shared::models::{
    DiagramFragment, FunctionRecord, RenderedArtifact, SourceDocument, Span,
};
