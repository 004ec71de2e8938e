//! Greedy token-budget chunker

use serde::{Deserialize, Serialize};

use crate::features::detection::Language;
use crate::features::extraction::text_hints;
use crate::shared::models::{FlowHints, FunctionRecord, RecordId, SourceDocument, Span};

/// Ordered batch of record ids bounded by the token budget
///
/// Invariants: every record id appears in exactly one chunk; chunk
/// indexes are dense from 0; `estimated_tokens <= budget` unless the
/// chunk is a flagged oversized singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub record_ids: Vec<RecordId>,
    pub estimated_tokens: usize,
    /// Single record whose own cost exceeds the budget. Never
    /// truncated; the prompt builder requests a condensed summary
    pub oversized: bool,
}

impl Chunk {
    fn new(index: usize) -> Self {
        Self {
            index,
            record_ids: Vec::new(),
            estimated_tokens: 0,
            oversized: false,
        }
    }

    /// First record in the chunk, which names its entry point
    pub fn lead_record_id(&self) -> RecordId {
        self.record_ids[0]
    }
}

/// Estimated model-token cost of a text
pub fn estimate_tokens(text: &str, tokens_per_char: f32) -> usize {
    ((text.len() as f32) * tokens_per_char).ceil().max(1.0) as usize
}

/// Partition records into ordered chunks
///
/// When the document has no definitions at all, a synthetic
/// whole-document record is appended to `records` and becomes the
/// single chunk, so every run yields at least one chunk. When it has
/// definitions plus top-level statements, those statements become a
/// trailing synthetic main-flow record with a chunk of its own.
pub fn build_chunks(
    records: &mut Vec<FunctionRecord>,
    doc: &SourceDocument,
    token_budget: usize,
    tokens_per_char: f32,
) -> Vec<Chunk> {
    if records.is_empty() {
        let id = records.len() as RecordId;
        let mut synthetic = FunctionRecord::new(
            id,
            synthetic_name(doc.language),
            Span::new(0, doc.text.len(), 1, doc.line_count().max(1)),
            doc.text.clone(),
        )
        .with_hints(FlowHints {
            complexity: 1,
            ..Default::default()
        });
        synthetic.synthetic = true;
        records.push(synthetic);
        tracing::debug!("no definitions found, chunking whole document as one synthetic unit");
    } else if let Some((text, hints)) = top_level_residual(records, doc) {
        let id = records.len() as RecordId;
        let mut synthetic = FunctionRecord::new(
            id,
            synthetic_name(doc.language),
            Span::new(0, doc.text.len(), 1, doc.line_count().max(1)),
            text,
        )
        .with_hints(hints);
        synthetic.synthetic = true;
        records.push(synthetic);
        tracing::debug!("top-level statements chunked as a trailing synthetic unit");
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = Chunk::new(0);

    for record in records.iter() {
        let cost = estimate_tokens(&record.text, tokens_per_char);

        // The synthetic main-flow unit never shares a chunk with a
        // definition; flush whatever is open first
        if record.synthetic && !current.record_ids.is_empty() {
            current.index = chunks.len();
            chunks.push(std::mem::replace(&mut current, Chunk::new(0)));
        }

        if cost > token_budget {
            // Oversized record: flush the open chunk, then emit the
            // record as its own flagged chunk
            if !current.record_ids.is_empty() {
                let index = chunks.len();
                current.index = index;
                chunks.push(std::mem::replace(&mut current, Chunk::new(0)));
            }
            let mut oversized = Chunk::new(chunks.len());
            oversized.record_ids.push(record.id);
            oversized.estimated_tokens = cost;
            oversized.oversized = true;
            tracing::warn!(
                record = record.name.as_str(),
                cost,
                token_budget,
                "record alone exceeds budget, emitting oversized chunk"
            );
            chunks.push(oversized);
            continue;
        }

        if current.estimated_tokens + cost > token_budget && !current.record_ids.is_empty() {
            current.index = chunks.len();
            chunks.push(std::mem::replace(&mut current, Chunk::new(0)));
        }
        current.record_ids.push(record.id);
        current.estimated_tokens += cost;
    }

    if !current.record_ids.is_empty() {
        current.index = chunks.len();
        chunks.push(current);
    }

    chunks
}

fn synthetic_name(language: Language) -> String {
    format!("{}_main_flow", language.name())
}

/// Document text no top-level record owns, when it holds anything
/// beyond blank lines and comments
fn top_level_residual(
    records: &[FunctionRecord],
    doc: &SourceDocument,
) -> Option<(String, FlowHints)> {
    let mut spans: Vec<(usize, usize)> = records
        .iter()
        .filter(|r| r.parent_id.is_none())
        .map(|r| (r.span.start_byte, r.span.end_byte))
        .collect();
    spans.sort_unstable();

    let mut residual = String::new();
    let mut cursor = 0usize;
    for (start, end) in spans {
        if start > cursor {
            residual.push_str(doc.slice(cursor, start));
        }
        cursor = cursor.max(end);
    }
    residual.push_str(doc.slice(cursor, doc.text.len()));

    let meaningful = residual.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#') && !line.starts_with("//")
    });
    if !meaningful {
        return None;
    }

    let text = residual.trim().to_string();
    let hints = text_hints(&text);
    Some((text, hints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn record(id: RecordId, name: &str, text: &str) -> FunctionRecord {
        FunctionRecord::new(id, name, Span::new(0, text.len(), 1, 1), text)
    }

    fn doc(text: &str) -> SourceDocument {
        SourceDocument::new(text, None, crate::features::detection::Language::Python)
    }

    #[test]
    fn test_two_small_functions_share_one_chunk() {
        let mut records = vec![
            record(0, "a", "def a(): pass"),
            record(1, "b", "def b(): a()"),
        ];
        let chunks = build_chunks(&mut records, &doc(""), 1000, 0.3);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].record_ids, vec![0, 1]);
        assert!(!chunks[0].oversized);
    }

    #[test]
    fn test_budget_splits_chunks_in_source_order() {
        let body = "x".repeat(100);
        let mut records = vec![
            record(0, "a", &body),
            record(1, "b", &body),
            record(2, "c", &body),
        ];
        // Each record costs 100 tokens at ratio 1.0; budget fits two
        let chunks = build_chunks(&mut records, &doc(""), 200, 1.0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].record_ids, vec![0, 1]);
        assert_eq!(chunks[1].record_ids, vec![2]);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_oversized_record_becomes_flagged_singleton() {
        let big = "y".repeat(5000);
        let mut records = vec![
            record(0, "small", "def s(): pass"),
            record(1, "huge", &big),
            record(2, "tail", "def t(): pass"),
        ];
        let chunks = build_chunks(&mut records, &doc(""), 100, 1.0);
        assert_eq!(chunks.len(), 3);
        assert!(!chunks[0].oversized);
        assert!(chunks[1].oversized);
        assert_eq!(chunks[1].record_ids, vec![1]);
        assert!(chunks[1].estimated_tokens > 100);
        assert!(!chunks[2].oversized);
    }

    #[test]
    fn test_empty_records_get_synthetic_whole_document_chunk() {
        let mut records = Vec::new();
        let document = doc("x = 1\ny = 2\n");
        let chunks = build_chunks(&mut records, &document, 1000, 0.3);
        assert_eq!(chunks.len(), 1);
        assert_eq!(records.len(), 1);
        assert!(records[0].synthetic);
        assert_eq!(records[0].name, "python_main_flow");
        assert_eq!(records[0].text, document.text);
    }

    #[test]
    fn test_top_level_code_gets_trailing_main_chunk() {
        let mut records = vec![record(0, "a", "def a(): pass")];
        let document = doc("def a(): pass\nx = 1\nrun(x)\n");
        let chunks = build_chunks(&mut records, &document, 1000, 0.3);

        assert_eq!(records.len(), 2);
        assert!(records[1].synthetic);
        assert_eq!(records[1].name, "python_main_flow");
        assert!(records[1].text.contains("x = 1"));
        assert!(!records[1].text.contains("def a"));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].record_ids, vec![0]);
        assert_eq!(chunks[1].record_ids, vec![1]);
    }

    #[test]
    fn test_comment_only_residual_adds_no_main_chunk() {
        let mut records = vec![record(0, "a", "def a(): pass")];
        let document = doc("def a(): pass\n\n# just a note\n");
        let chunks = build_chunks(&mut records, &document, 1000, 0.3);

        assert_eq!(records.len(), 1);
        assert_eq!(chunks.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_every_record_in_exactly_one_chunk(
            sizes in proptest::collection::vec(1usize..400, 1..40),
            budget in 50usize..500,
        ) {
            let mut records: Vec<FunctionRecord> = sizes
                .iter()
                .enumerate()
                .map(|(i, n)| record(i as RecordId, "f", &"z".repeat(*n)))
                .collect();
            let chunks = build_chunks(&mut records, &doc(""), budget, 1.0);

            let mut seen: Vec<RecordId> = chunks.iter().flat_map(|c| c.record_ids.clone()).collect();
            let expected: Vec<RecordId> = (0..records.len() as RecordId).collect();
            prop_assert_eq!(&seen, &expected);
            seen.dedup();
            prop_assert_eq!(seen.len(), records.len());

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                if !chunk.oversized {
                    prop_assert!(chunk.estimated_tokens <= budget);
                } else {
                    prop_assert_eq!(chunk.record_ids.len(), 1);
                }
            }
        }
    }
}
