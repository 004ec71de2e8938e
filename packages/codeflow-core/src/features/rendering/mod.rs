//! Diagram rendering
//!
//! Turns assembled mermaid text into an image via an external
//! rendering service. Rendering failures never fail a run; the caller
//! falls back to text-only output.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use std::time::Duration;

/// A rendering failure; always recoverable
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render request failed: {0}")]
    Network(String),
    #[error("render service returned status {0}")]
    Service(u16),
}

#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    /// Render diagram notation into image bytes
    async fn render(&self, notation: &str) -> Result<Vec<u8>, RenderError>;
}

/// Renderer backed by the mermaid.ink public service
///
/// The diagram text travels url-safe-base64-encoded in the request
/// path, so no request body is needed.
pub struct MermaidInkRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl MermaidInkRenderer {
    pub fn new(timeout: Duration) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: "https://mermaid.ink".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request URL for a given diagram; exposed for inspection
    pub fn svg_url(&self, notation: &str) -> String {
        let encoded = URL_SAFE.encode(notation.as_bytes());
        format!("{}/svg/{}", self.base_url, encoded)
    }
}

#[async_trait]
impl DiagramRenderer for MermaidInkRenderer {
    async fn render(&self, notation: &str) -> Result<Vec<u8>, RenderError> {
        let url = self.svg_url(notation);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RenderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Service(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Network(e.to_string()))?;
        tracing::debug!(bytes = bytes.len(), "diagram rendered");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_url_is_url_safe() {
        let renderer = MermaidInkRenderer::new(Duration::from_secs(5)).unwrap();
        let url = renderer.svg_url("graph TD\n    a[X] -->|Yes| b[Y]\n");
        assert!(url.starts_with("https://mermaid.ink/svg/"));
        let path = url.rsplit('/').next().unwrap();
        assert!(!path.contains('+'));
        assert!(!path.contains('/'));
    }

    #[test]
    fn test_svg_url_round_trips_notation() {
        let renderer = MermaidInkRenderer::new(Duration::from_secs(5)).unwrap();
        let notation = "graph TD\n    start([Start]) --> done([End])\n";
        let url = renderer.svg_url(notation);
        let encoded = url.rsplit('/').next().unwrap();
        let decoded = URL_SAFE.decode(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), notation);
    }
}
