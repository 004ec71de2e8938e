//! Error types for codeflow-core
//!
//! Only two conditions abort a pipeline run: a grammar that cannot be
//! loaded and a permanent model-service failure. Everything else
//! degrades and is reported as a [`Degradation`] on the run outcome.

use thiserror::Error;

/// Fatal error type for codeflow operations
#[derive(Debug, Error)]
pub enum FlowError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Grammar for the detected language could not be loaded
    #[error("parser unavailable for {language}: {reason}")]
    ParseUnavailable { language: String, reason: String },

    /// Model service rejected the request in a non-retryable way
    #[error("permanent model failure: {0}")]
    ModelPermanent(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl FlowError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        FlowError::Config(msg.into())
    }

    pub fn parse_unavailable(language: impl Into<String>, reason: impl Into<String>) -> Self {
        FlowError::ParseUnavailable {
            language: language.into(),
            reason: reason.into(),
        }
    }
}

/// Recoverable conditions recorded alongside the best-effort artifact
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Degradation {
    /// No extension hint and content heuristics could not pick a clear
    /// winner; extraction fell back to the generic tokenizing path
    DetectionAmbiguous { detail: String },
    /// Parser produced a best-effort tree with error nodes
    ParsePartial { issue_count: usize },
    /// A single record exceeded the token budget and became its own
    /// condensed-prompt chunk
    ChunkOversized { chunk_index: usize, estimated_tokens: usize },
    /// Retries exhausted for one chunk; a placeholder fragment was used
    ModelTransientFailure { chunk_index: usize, attempts: u32, reason: String },
    /// A fragment or edge could not be reconciled during assembly
    AssemblyInconsistent { detail: String },
    /// Vector rendering failed; the textual diagram is still returned
    RenderFailure { reason: String },
}

/// Result type alias for codeflow operations
pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unavailable_display() {
        let err = FlowError::parse_unavailable("python", "grammar version mismatch");
        assert_eq!(
            err.to_string(),
            "parser unavailable for python: grammar version mismatch"
        );
    }

    #[test]
    fn test_degradation_serializes() {
        let d = Degradation::ChunkOversized {
            chunk_index: 2,
            estimated_tokens: 9000,
        };
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("ChunkOversized"));
    }
}
