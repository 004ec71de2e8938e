//! Model client
//!
//! Port for the external generative-model service, its failure
//! taxonomy, bounded retry with exponential backoff, and the shared
//! rate limiter guarding concurrent calls. The HTTP implementation
//! lives in [`http`].

mod http;
mod retry;

pub use http::{HttpModelClient, ModelConfig};
pub use retry::{complete_with_retry, RateLimiter, RetryPolicy};

use async_trait::async_trait;
use thiserror::Error;

/// Model-service failure, split into transient (retryable) and
/// permanent (propagates immediately) classes
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("network error: {0}")]
    Network(String),

    #[error("service error {status}: {message}")]
    Service { status: u16, message: String },

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Transient failures are retried up to the configured bound;
    /// everything else aborts the call immediately
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Timeout | ModelError::Network(_) | ModelError::RateLimited { .. } => true,
            ModelError::Service { status, .. } => *status >= 500,
            ModelError::InvalidResponse(_) => true,
            ModelError::Auth(_) | ModelError::InvalidRequest(_) => false,
        }
    }
}

/// Port for the synchronous request/response model-service collaborator
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one prompt, get raw response text
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Strip code fences and normalize the notation header
///
/// Models wrap fragments in ```mermaid fences and sometimes forget the
/// graph header; both are repaired here at the model boundary so
/// assembly only ever sees bare notation.
pub fn normalize_fragment(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(start) = text.find("```mermaid") {
        let after = &text[start + "```mermaid".len()..];
        text = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
    } else if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        text = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
    }

    let text = text.trim();
    if text.starts_with("graph ") || text.starts_with("flowchart ") {
        text.to_string()
    } else {
        format!("graph TD\n{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ModelError::Timeout.is_transient());
        assert!(ModelError::RateLimited { retry_after_ms: None }.is_transient());
        assert!(ModelError::Service { status: 503, message: String::new() }.is_transient());
        assert!(!ModelError::Service { status: 422, message: String::new() }.is_transient());
        assert!(!ModelError::Auth("bad key".into()).is_transient());
        assert!(!ModelError::InvalidRequest("schema".into()).is_transient());
    }

    #[test]
    fn test_normalize_strips_mermaid_fence() {
        let raw = "Here you go:\n```mermaid\ngraph TD\n    a --> b\n```\nDone.";
        assert_eq!(normalize_fragment(raw), "graph TD\n    a --> b");
    }

    #[test]
    fn test_normalize_strips_bare_fence() {
        let raw = "```\ngraph TD\n    a --> b\n```";
        assert_eq!(normalize_fragment(raw), "graph TD\n    a --> b");
    }

    #[test]
    fn test_normalize_adds_missing_header() {
        let raw = "    a[Start] --> b[End]";
        assert_eq!(normalize_fragment(raw), "graph TD\na[Start] --> b[End]");
    }

    #[test]
    fn test_normalize_keeps_flowchart_header() {
        let raw = "flowchart LR\n    a --> b";
        assert_eq!(normalize_fragment(raw), "flowchart LR\n    a --> b");
    }
}
