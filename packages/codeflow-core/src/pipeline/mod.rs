//! End-to-end orchestration

pub mod config;
pub mod events;
pub mod runner;

pub use config::PipelineConfig;
pub use events::{PipelineEvent, ProgressCallback};
pub use runner::{Pipeline, PipelineOutcome};
