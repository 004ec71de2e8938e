//! Diagram fragments and the final artifact

use serde::{Deserialize, Serialize};

/// Raw diagram-notation text returned by the model for one chunk
///
/// Fragment ordering matches chunk ordering. A fragment with
/// `parsed = false` contributes only an unresolved placeholder node to
/// assembly but is still recorded for error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramFragment {
    pub chunk_index: usize,
    pub text: String,
    pub parsed: bool,
}

impl DiagramFragment {
    pub fn new(chunk_index: usize, text: impl Into<String>) -> Self {
        Self {
            chunk_index,
            text: text.into(),
            parsed: true,
        }
    }

    /// Placeholder fragment for a chunk whose model call never produced
    /// usable notation (retry exhaustion, cancellation)
    pub fn failed(chunk_index: usize) -> Self {
        Self {
            chunk_index,
            text: String::new(),
            parsed: false,
        }
    }

    /// Fragment whose model call succeeded but whose text contains no
    /// parseable notation; the text is kept for error reporting
    pub fn unparseable(chunk_index: usize, text: impl Into<String>) -> Self {
        Self {
            chunk_index,
            text: text.into(),
            parsed: false,
        }
    }
}

/// Terminal pipeline output: the textual diagram is the primary
/// artifact, the vector image a convenience view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    /// Assembled diagram-notation text
    pub notation: String,
    /// SVG bytes, absent when rendering failed or was skipped
    pub image: Option<Vec<u8>>,
    pub render_failed: bool,
}

impl RenderedArtifact {
    pub fn rendered(notation: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            notation: notation.into(),
            image: Some(image),
            render_failed: false,
        }
    }

    /// Rendering degraded; the notation text still stands on its own
    pub fn text_only(notation: impl Into<String>, render_failed: bool) -> Self {
        Self {
            notation: notation.into(),
            image: None,
            render_failed,
        }
    }
}
