//! Shared data model
//!
//! Entities live for one pipeline run only; nothing here persists
//! across runs.

mod document;
mod fragment;
mod record;
mod span;

pub use document::SourceDocument;
pub use fragment::{DiagramFragment, RenderedArtifact};
pub use record::{FlowHints, FunctionRecord, RecordId};
pub use span::Span;
