//! Generic tokenizing extractor
//!
//! Fallback for documents whose language stayed unknown. Scans line by
//! line for definition-looking signatures and cuts the document at
//! each one. Much cruder than the grammar path; a document where even
//! this finds nothing flows through as the chunker's synthetic unit.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::shared::models::{FlowHints, FunctionRecord, Span};

static DEF_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // python / ruby style
        Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap(),
        // javascript style
        Regex::new(r"^\s*function\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*\(").unwrap(),
        Regex::new(r"^\s*(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(?:async\s*)?\(").unwrap(),
        // c style signature opening a block
        Regex::new(r"^[A-Za-z_][\w\s\*]*\s\*?([A-Za-z_][A-Za-z0-9_]*)\s*\([^;]*\)\s*\{?\s*$").unwrap(),
    ]
});

fn definition_name(line: &str) -> Option<String> {
    DEF_PATTERNS
        .iter()
        .find_map(|re| re.captures(line).map(|c| c[1].to_string()))
}

/// Keyword-counting hints for text no grammar has seen
pub(crate) fn text_hints(text: &str) -> FlowHints {
    let has_loops = text.contains("for ") || text.contains("while ");
    let has_conditionals = text.contains("if ") || text.contains("if(");
    let complexity = 1
        + ["if ", "elif ", "else if", "for ", "while ", "case ", "&&", "||", " and ", " or "]
            .iter()
            .map(|kw| text.matches(kw).count() as u32)
            .sum::<u32>();
    FlowHints {
        has_loops,
        has_conditionals,
        calls: Vec::new(),
        complexity,
    }
}

/// Extract records from text without a grammar
///
/// Each detected definition spans from its signature line to the line
/// before the next one (or end of input).
pub fn extract_generic(text: &str) -> Vec<FunctionRecord> {
    // (line index, byte offset of line start, name)
    let mut starts: Vec<(usize, usize, String)> = Vec::new();
    let mut offset = 0usize;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        if let Some(name) = definition_name(line) {
            starts.push((idx, offset, name));
        }
        offset += line.len();
    }

    let mut records = Vec::with_capacity(starts.len());
    for (i, (line_idx, byte_start, name)) in starts.iter().enumerate() {
        let byte_end = starts.get(i + 1).map(|s| s.1).unwrap_or(text.len());
        let body = &text[*byte_start..byte_end];
        let end_line = *line_idx + body.trim_end_matches('\n').matches('\n').count();
        let span = Span::new(
            *byte_start,
            byte_end,
            *line_idx as u32 + 1,
            end_line as u32 + 1,
        );
        records.push(
            FunctionRecord::new(i as u32, name.clone(), span, body).with_hints(text_hints(body)),
        );
    }

    tracing::debug!(count = records.len(), "generic extraction");
    records
}
