//! Pipeline runner
//!
//! Drives one document through detection, indexing, extraction,
//! chunking, the concurrent model phase, assembly, and rendering.
//! Recoverable trouble is folded into the outcome's degradation list;
//! only I/O, missing grammars, bad config, and permanently rejected
//! model requests abort a run.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::errors::{Degradation, FlowError, Result};
use crate::features::assembly::{assemble, parse_fragment, ChunkMeta};
use crate::features::chunking::{build_chunks, Chunk};
use crate::features::detection::{detect, Language};
use crate::features::extraction::{extract, extract_generic};
use crate::features::llm::{
    complete_with_retry, normalize_fragment, ModelClient, RateLimiter, RetryPolicy,
};
use crate::features::parsing::SyntaxIndexer;
use crate::features::prompting::build_prompt;
use crate::features::rendering::DiagramRenderer;
use crate::shared::models::{DiagramFragment, FunctionRecord, RenderedArtifact, SourceDocument};

use super::config::PipelineConfig;
use super::events::{PipelineEvent, ProgressCallback};

/// Everything a completed run produced
#[derive(Debug)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub language: Language,
    pub artifact: RenderedArtifact,
    pub function_count: usize,
    pub chunk_count: usize,
    /// Per-chunk fragment health, indexed by chunk
    pub fragment_statuses: Vec<bool>,
    pub degradations: Vec<Degradation>,
}

impl PipelineOutcome {
    pub fn failed_fragment_count(&self) -> usize {
        self.fragment_statuses.iter().filter(|ok| !**ok).count()
    }
}

pub struct Pipeline {
    client: Arc<dyn ModelClient>,
    renderer: Option<Arc<dyn DiagramRenderer>>,
    config: PipelineConfig,
    progress: Option<ProgressCallback>,
}

impl Pipeline {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            renderer: None,
            config: PipelineConfig::default(),
            progress: None,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(cb) = &self.progress {
            cb(&event);
        }
    }

    /// Record a degradation and notify observers in one step
    fn degrade(&self, degradations: &mut Vec<Degradation>, degradation: Degradation) {
        self.emit(PipelineEvent::Degraded(degradation.clone()));
        degradations.push(degradation);
    }

    /// Run the full pipeline over one document
    pub async fn run(&self, text: &str, filename_hint: Option<&str>) -> Result<PipelineOutcome> {
        let run_id = Uuid::new_v4();
        let mut degradations = Vec::new();

        let language = detect(text, filename_hint);
        tracing::info!(%run_id, language = language.name(), "pipeline run started");
        self.emit(PipelineEvent::LanguageDetected { language });
        if language == Language::Unknown {
            self.degrade(
                &mut degradations,
                Degradation::DetectionAmbiguous {
                    detail: "no extension hint and content heuristics scored below threshold"
                        .to_string(),
                },
            );
        }

        let doc = SourceDocument::new(text, filename_hint.map(str::to_string), language);

        let mut records = self.extract_records(&doc, &mut degradations)?;
        self.emit(PipelineEvent::FunctionsExtracted {
            count: records.len(),
        });

        let chunks = build_chunks(
            &mut records,
            &doc,
            self.config.token_budget,
            self.config.tokens_per_char,
        );
        for chunk in &chunks {
            if chunk.oversized {
                self.degrade(
                    &mut degradations,
                    Degradation::ChunkOversized {
                        chunk_index: chunk.index,
                        estimated_tokens: chunk.estimated_tokens,
                    },
                );
            }
        }
        self.emit(PipelineEvent::ChunksBuilt {
            count: chunks.len(),
        });

        let fragments = self
            .model_phase(&chunks, &records, language, &mut degradations)
            .await?;
        let fragment_statuses: Vec<bool> = fragments.iter().map(|f| f.parsed).collect();

        let metas: Vec<ChunkMeta> = chunks
            .iter()
            .map(|chunk| ChunkMeta {
                index: chunk.index,
                title: records[chunk.lead_record_id() as usize].name.clone(),
                function_names: chunk
                    .record_ids
                    .iter()
                    .map(|&id| records[id as usize].name.clone())
                    .collect(),
                lead_record_id: chunk.lead_record_id(),
            })
            .collect();

        let (graph, assembly_degradations) =
            assemble(&fragments, &metas, &self.config.notation.direction);
        for degradation in assembly_degradations {
            self.degrade(&mut degradations, degradation);
        }
        self.emit(PipelineEvent::Assembled {
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
        });

        let notation = graph.to_mermaid();
        let artifact = self.render_phase(notation, &mut degradations).await;
        self.emit(PipelineEvent::Rendered {
            image: artifact.image.is_some(),
        });

        let function_count = records.iter().filter(|r| !r.synthetic).count();
        tracing::info!(
            %run_id,
            functions = function_count,
            chunks = chunks.len(),
            degraded = degradations.len(),
            "pipeline run finished"
        );

        Ok(PipelineOutcome {
            run_id,
            language,
            artifact,
            function_count,
            chunk_count: chunks.len(),
            fragment_statuses,
            degradations,
        })
    }

    /// Syntax-driven extraction for supported languages, regex fallback
    /// for everything else
    fn extract_records(
        &self,
        doc: &SourceDocument,
        degradations: &mut Vec<Degradation>,
    ) -> Result<Vec<FunctionRecord>> {
        if doc.language == Language::Unknown {
            return Ok(extract_generic(&doc.text));
        }

        let tree = SyntaxIndexer::parse(doc)?;
        if tree.has_issues() {
            self.degrade(
                degradations,
                Degradation::ParsePartial {
                    issue_count: tree.issues.len(),
                },
            );
        }
        Ok(extract(doc, &tree))
    }

    /// Fan prompts out under a concurrency cap, fan fragments in by
    /// chunk index
    async fn model_phase(
        &self,
        chunks: &[Chunk],
        records: &[FunctionRecord],
        language: Language,
        degradations: &mut Vec<Degradation>,
    ) -> Result<Vec<DiagramFragment>> {
        let limiter = Arc::new(RateLimiter::new(self.config.min_request_interval));
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let policy = RetryPolicy {
            max_attempts: self.config.max_attempts,
            base_backoff: self.config.base_backoff,
        };

        let mut tasks: JoinSet<(usize, std::result::Result<String, crate::features::llm::ModelError>)> =
            JoinSet::new();
        for chunk in chunks {
            let prompt = build_prompt(chunk, records, language, &self.config.notation);
            let index = chunk.index;
            let client = Arc::clone(&self.client);
            let limiter = Arc::clone(&limiter);
            let semaphore = Arc::clone(&semaphore);
            let policy = policy.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = complete_with_retry(client.as_ref(), &limiter, &prompt, &policy).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<DiagramFragment>> = vec![None; chunks.len()];
        let deadline = tokio::time::Instant::now() + self.config.run_timeout;
        let mut permanent: Option<FlowError> = None;

        while !tasks.is_empty() {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining == Duration::ZERO {
                break;
            }
            let joined = tokio::time::timeout(remaining, tasks.join_next()).await;
            let Ok(Some(joined)) = joined else {
                break; // run timeout
            };
            let (index, result) = joined.map_err(|e| FlowError::config(format!("chunk task panicked: {e}")))?;
            match result {
                Ok(raw) => {
                    let normalized = normalize_fragment(&raw);
                    if parse_fragment(&normalized).is_empty() {
                        self.degrade(
                            degradations,
                            Degradation::AssemblyInconsistent {
                                detail: format!(
                                    "chunk {index} response contained no parseable notation"
                                ),
                            },
                        );
                        self.emit(PipelineEvent::FragmentReady {
                            chunk_index: index,
                            parsed: false,
                        });
                        slots[index] = Some(DiagramFragment::unparseable(index, normalized));
                    } else {
                        self.emit(PipelineEvent::FragmentReady {
                            chunk_index: index,
                            parsed: true,
                        });
                        slots[index] = Some(DiagramFragment::new(index, normalized));
                    }
                }
                Err(err) if err.is_transient() => {
                    self.degrade(
                        degradations,
                        Degradation::ModelTransientFailure {
                            chunk_index: index,
                            attempts: policy.max_attempts,
                            reason: err.to_string(),
                        },
                    );
                    self.emit(PipelineEvent::FragmentReady {
                        chunk_index: index,
                        parsed: false,
                    });
                    slots[index] = Some(DiagramFragment::failed(index));
                }
                Err(err) => {
                    permanent = Some(FlowError::ModelPermanent(err.to_string()));
                    break;
                }
            }
        }
        tasks.abort_all();

        if let Some(err) = permanent {
            return Err(err);
        }

        // Chunks still open at the deadline degrade to placeholders
        let mut fragments = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(fragment) => fragments.push(fragment),
                None => {
                    tracing::warn!(chunk = index, "chunk unfinished at run timeout");
                    self.degrade(
                        degradations,
                        Degradation::ModelTransientFailure {
                            chunk_index: index,
                            attempts: policy.max_attempts,
                            reason: "run timeout elapsed".to_string(),
                        },
                    );
                    fragments.push(DiagramFragment::failed(index));
                }
            }
        }
        Ok(fragments)
    }

    async fn render_phase(
        &self,
        notation: String,
        degradations: &mut Vec<Degradation>,
    ) -> RenderedArtifact {
        let renderer = match (&self.renderer, self.config.render_image) {
            (Some(renderer), true) => renderer,
            _ => return RenderedArtifact::text_only(notation, false),
        };

        match renderer.render(&notation).await {
            Ok(image) => RenderedArtifact::rendered(notation, image),
            Err(err) => {
                self.degrade(
                    degradations,
                    Degradation::RenderFailure {
                        reason: err.to_string(),
                    },
                );
                RenderedArtifact::text_only(notation, true)
            }
        }
    }
}
