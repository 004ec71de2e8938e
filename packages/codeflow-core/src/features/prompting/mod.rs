//! Prompt construction
//!
//! Renders one chunk into the structured instruction the model sees.
//! Purely textual; no I/O happens here. The notation rules embedded in
//! the prompt are the same vocabulary the assembler parses back out,
//! so the two must evolve together.

use serde::{Deserialize, Serialize};

use crate::features::chunking::Chunk;
use crate::features::detection::Language;
use crate::shared::models::FunctionRecord;

/// Target diagram-notation vocabulary the model must emit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotationConfig {
    /// Flow direction header, e.g. "TD" or "LR"
    pub direction: String,
    /// Hard cap the prompt asks for on node label length
    pub max_label_chars: usize,
}

impl Default for NotationConfig {
    fn default() -> Self {
        Self {
            direction: "TD".to_string(),
            max_label_chars: 40,
        }
    }
}

/// Node-id prefix for a chunk, keeping fragment ids collision-free
/// before the assembler re-keys them globally
pub fn chunk_prefix(chunk_index: usize) -> String {
    format!("n{}", chunk_index)
}

/// Build the instruction string for one chunk
///
/// `records` is the full arena; the chunk's ids index into it.
pub fn build_prompt(
    chunk: &Chunk,
    records: &[FunctionRecord],
    language: Language,
    notation: &NotationConfig,
) -> String {
    let members: Vec<&FunctionRecord> = chunk
        .record_ids
        .iter()
        .map(|&id| &records[id as usize])
        .collect();
    let lead = members[0];
    let prefix = chunk_prefix(chunk.index);

    let mut context = String::new();
    for rec in &members {
        context.push_str(&format!(
            "- {} (complexity {})",
            rec.name, rec.hints.complexity
        ));
        if rec.hints.has_loops {
            context.push_str(", contains loops: draw the back-edge");
        }
        if rec.hints.has_conditionals {
            context.push_str(", contains conditionals: use decision diamonds");
        }
        if !rec.hints.calls.is_empty() {
            let calls: Vec<&str> = rec.hints.calls.iter().take(5).map(|s| s.as_str()).collect();
            context.push_str(&format!(", calls: {}", calls.join(", ")));
        }
        context.push('\n');
    }

    let source: String = members
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    if chunk.oversized {
        return format!(
            "You are an expert flowchart generator. The following {lang} code is too large \
for full detail. Produce a CONDENSED mermaid fragment: a single summary node describing \
what `{name}` does overall, plus at most two supporting nodes for its dominant control flow.\n\
\n\
RULES:\n\
1. Start with: graph {dir}\n\
2. Second line must be exactly: %% entry: {name}\n\
3. Every node id must start with the prefix {prefix}_ (e.g. {prefix}_1)\n\
4. Keep labels under {max} characters\n\
5. Output only the mermaid code, no explanations\n\
\n\
FUNCTION CONTEXT:\n{context}\n\
CODE TO SUMMARIZE:\n```\n{source}\n```\n",
            lang = language.name(),
            name = lead.name,
            dir = notation.direction,
            prefix = prefix,
            max = notation.max_label_chars,
            context = context,
            source = source,
        );
    }

    let exit_rule = if members.iter().any(|r| !r.hints.calls.is_empty()) {
        let mut called: Vec<&str> = members
            .iter()
            .flat_map(|r| r.hints.calls.iter())
            .map(|s| s.as_str())
            .collect();
        called.dedup();
        format!(
            "7. For each call into another function ({}), add a comment line: %% exit: <function name>\n",
            called.join(", ")
        )
    } else {
        String::new()
    };

    format!(
        "You are an expert flowchart generator. Convert this {lang} code into a mermaid flowchart.\n\
\n\
FUNCTION CONTEXT:\n{context}\n\
CRITICAL MERMAID RULES:\n\
1. Start with: graph {dir}\n\
2. Second line must be exactly: %% entry: {name}\n\
3. Every node id must start with the prefix {prefix}_ (e.g. {prefix}_1, {prefix}_2)\n\
4. Node shapes: start/end ID([Label]), process ID[Label], decision ID{{Label?}}, loop ID[/Label/]\n\
5. For loops show the back-edge (LoopEnd --> LoopStart); for branches label edges with |Yes| and |No|\n\
6. Keep labels under {max} characters and show all important logic flow\n\
{exit_rule}\
\n\
EXAMPLE:\n\
```mermaid\n\
graph {dir}\n\
%% entry: check\n\
    {prefix}_1([Start])\n\
    {prefix}_2{{i < 10?}}\n\
    {prefix}_3[Process i]\n\
    {prefix}_1 --> {prefix}_2\n\
    {prefix}_2 -->|Yes| {prefix}_3\n\
    {prefix}_3 --> {prefix}_2\n\
```\n\
\n\
CODE TO CONVERT:\n```\n{source}\n```\n\
\n\
Generate ONLY the mermaid code (no explanations):",
        lang = language.name(),
        context = context,
        dir = notation.direction,
        name = lead.name,
        prefix = prefix,
        max = notation.max_label_chars,
        exit_rule = exit_rule,
        source = source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{FlowHints, Span};

    fn record(id: u32, name: &str, text: &str, calls: Vec<String>) -> FunctionRecord {
        FunctionRecord::new(id, name, Span::new(0, text.len(), 1, 1), text).with_hints(FlowHints {
            has_loops: false,
            has_conditionals: true,
            calls,
            complexity: 2,
        })
    }

    fn chunk(ids: Vec<u32>, oversized: bool) -> Chunk {
        Chunk {
            index: 1,
            record_ids: ids,
            estimated_tokens: 10,
            oversized,
        }
    }

    #[test]
    fn test_prompt_contains_source_verbatim() {
        let records = vec![record(0, "fib", "def fib(n):\n    return n", vec![])];
        let prompt = build_prompt(&chunk(vec![0], false), &records, Language::Python, &NotationConfig::default());
        assert!(prompt.contains("def fib(n):\n    return n"));
        assert!(prompt.contains("graph TD"));
        assert!(prompt.contains("%% entry: fib"));
    }

    #[test]
    fn test_prompt_uses_chunk_prefix() {
        let records = vec![record(0, "f", "def f(): pass", vec![])];
        let prompt = build_prompt(&chunk(vec![0], false), &records, Language::Python, &NotationConfig::default());
        assert!(prompt.contains("n1_"));
    }

    #[test]
    fn test_prompt_lists_exit_labels_for_calls() {
        let records = vec![record(0, "f", "def f(): g()", vec!["g".to_string()])];
        let prompt = build_prompt(&chunk(vec![0], false), &records, Language::Python, &NotationConfig::default());
        assert!(prompt.contains("%% exit: <function name>"));
        assert!(prompt.contains("calls: g"));
    }

    #[test]
    fn test_oversized_chunk_requests_condensed_summary() {
        let records = vec![record(0, "huge", "def huge(): ...", vec![])];
        let prompt = build_prompt(&chunk(vec![0], true), &records, Language::Python, &NotationConfig::default());
        assert!(prompt.contains("CONDENSED"));
        assert!(prompt.contains("single summary node"));
        // The source is still included, never omitted
        assert!(prompt.contains("def huge(): ..."));
    }
}
