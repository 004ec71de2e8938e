//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::features::prompting::NotationConfig;

/// Tunables for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Token budget per chunk
    pub token_budget: usize,
    /// Estimated tokens per source character
    pub tokens_per_char: f32,
    /// Max concurrent model requests
    pub parallelism: usize,
    /// Minimum spacing between model request starts
    #[serde(with = "duration_ms")]
    pub min_request_interval: Duration,
    /// Per-request attempt cap
    pub max_attempts: u32,
    /// Base backoff before the first retry
    #[serde(with = "duration_ms")]
    pub base_backoff: Duration,
    /// Wall-clock ceiling for the whole model phase
    #[serde(with = "duration_ms")]
    pub run_timeout: Duration,
    /// Timeout for one rendering request
    #[serde(with = "duration_ms")]
    pub render_timeout: Duration,
    /// Whether to request an image from the rendering service
    pub render_image: bool,
    pub notation: NotationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            token_budget: 2800,
            tokens_per_char: 0.3,
            parallelism: 4,
            min_request_interval: Duration::from_millis(500),
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            run_timeout: Duration::from_secs(300),
            render_timeout: Duration::from_secs(30),
            render_image: true,
            notation: NotationConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_token_budget(mut self, token_budget: usize) -> Self {
        self.token_budget = token_budget;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_render_image(mut self, render_image: bool) -> Self {
        self.render_image = render_image;
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_sane() {
        let config = PipelineConfig::default();
        assert!(config.token_budget > 0);
        assert!(config.parallelism >= 1);
        assert!(config.tokens_per_char > 0.0);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = PipelineConfig::default().with_parallelism(2);
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.parallelism, 2);
        assert_eq!(back.min_request_interval, config.min_request_interval);
    }

    #[test]
    fn test_parallelism_floor() {
        let config = PipelineConfig::default().with_parallelism(0);
        assert_eq!(config.parallelism, 1);
    }
}
