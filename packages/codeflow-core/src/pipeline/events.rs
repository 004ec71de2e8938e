//! Pipeline progress events

use crate::errors::Degradation;
use crate::features::detection::Language;

/// Emitted as a run moves through its stages
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    LanguageDetected {
        language: Language,
    },
    FunctionsExtracted {
        count: usize,
    },
    ChunksBuilt {
        count: usize,
    },
    FragmentReady {
        chunk_index: usize,
        parsed: bool,
    },
    Degraded(Degradation),
    Assembled {
        nodes: usize,
        edges: usize,
    },
    Rendered {
        image: bool,
    },
}

/// Observers receive every event in stage order; fragment events arrive
/// in completion order, not chunk order.
pub type ProgressCallback = Box<dyn Fn(&PipelineEvent) + Send + Sync>;
