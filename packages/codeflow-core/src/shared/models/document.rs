//! Source document model

use crate::features::detection::Language;

/// Raw submitted text plus detection results
///
/// Immutable once created; owned exclusively by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub text: String,
    pub filename: Option<String>,
    pub language: Language,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>, filename: Option<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            filename,
            language,
        }
    }

    /// Slice the document by byte range, clamped to valid bounds
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.text.len());
        let start = start.min(end);
        &self.text[start..end]
    }

    pub fn line_count(&self) -> u32 {
        self.text.lines().count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_clamps_to_bounds() {
        let doc = SourceDocument::new("def a(): pass", None, Language::Python);
        assert_eq!(doc.slice(0, 5), "def a");
        assert_eq!(doc.slice(0, 1000), "def a(): pass");
        assert_eq!(doc.slice(500, 1000), "");
    }
}
