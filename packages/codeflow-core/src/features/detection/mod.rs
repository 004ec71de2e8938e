//! Language detection
//!
//! Filename extension wins when present and recognized; otherwise
//! content heuristics score keyword and syntax markers per candidate
//! language, with ties broken by a fixed priority order. Detection
//! never errors: an unrecognizable document is tagged [`Language::Unknown`]
//! and downstream falls back to the generic tokenizing extractor.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Supported input languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    C,
    Unknown,
}

impl Language {
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::C => "c",
            Language::Unknown => "unknown",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::C => &["c", "h"],
            Language::Unknown => &[],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "c" | "h" => Some(Language::C),
            _ => None,
        }
    }

    pub fn from_file_path(path: &str) -> Option<Self> {
        path.rsplit('.').next().and_then(Self::from_extension)
    }

    /// Parse a user-supplied language name ("auto" and unknown names
    /// map to Unknown, which triggers content heuristics upstream)
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" => Language::JavaScript,
            "c" => Language::C,
            _ => Language::Unknown,
        }
    }
}

/// One content-heuristic rule: marker string, score, and whether the
/// marker must appear at a line start
struct Marker {
    needle: &'static str,
    at_line_start: bool,
    weight: u32,
}

/// Scoring table per language. Adding a language is a data change.
/// Priority order for ties: Python, C, JavaScript (matching the
/// candidate order below).
static MARKERS: Lazy<Vec<(Language, Vec<Marker>)>> = Lazy::new(|| {
    vec![
        (
            Language::Python,
            vec![
                Marker { needle: "def ", at_line_start: true, weight: 3 },
                Marker { needle: "import ", at_line_start: true, weight: 2 },
                Marker { needle: "from ", at_line_start: true, weight: 2 },
                Marker { needle: "async def ", at_line_start: true, weight: 3 },
                Marker { needle: "elif ", at_line_start: false, weight: 2 },
                Marker { needle: "self", at_line_start: false, weight: 1 },
                Marker { needle: ":\n", at_line_start: false, weight: 1 },
            ],
        ),
        (
            Language::C,
            vec![
                Marker { needle: "#include", at_line_start: true, weight: 4 },
                Marker { needle: "int main(", at_line_start: false, weight: 4 },
                Marker { needle: "printf(", at_line_start: false, weight: 2 },
                Marker { needle: "void ", at_line_start: false, weight: 1 },
                Marker { needle: "->", at_line_start: false, weight: 1 },
                Marker { needle: ";\n", at_line_start: false, weight: 1 },
            ],
        ),
        (
            Language::JavaScript,
            vec![
                Marker { needle: "function ", at_line_start: false, weight: 3 },
                Marker { needle: "const ", at_line_start: true, weight: 2 },
                Marker { needle: "let ", at_line_start: true, weight: 2 },
                Marker { needle: "=>", at_line_start: false, weight: 2 },
                Marker { needle: "console.log", at_line_start: false, weight: 2 },
                Marker { needle: "===", at_line_start: false, weight: 1 },
                Marker { needle: "var ", at_line_start: true, weight: 1 },
            ],
        ),
    ]
});

/// Score content against one language's marker table
fn score(text: &str, markers: &[Marker]) -> u32 {
    let mut total = 0;
    for marker in markers {
        if marker.at_line_start {
            let hits = text
                .lines()
                .filter(|line| line.trim_start().starts_with(marker.needle))
                .count() as u32;
            total += hits.min(4) * marker.weight;
        } else {
            let hits = text.matches(marker.needle).count() as u32;
            total += hits.min(4) * marker.weight;
        }
    }
    total
}

/// Guess the source language of submitted text
///
/// Fails softly to [`Language::Unknown`] rather than raising.
pub fn detect(text: &str, filename_hint: Option<&str>) -> Language {
    if let Some(hint) = filename_hint {
        if let Some(lang) = Language::from_file_path(hint) {
            tracing::debug!(language = lang.name(), hint, "language from extension hint");
            return lang;
        }
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Language::Unknown;
    }

    let mut best = Language::Unknown;
    let mut best_score = 0u32;
    for (lang, markers) in MARKERS.iter() {
        let s = score(trimmed, markers);
        // Strict inequality keeps the fixed priority order on ties
        if s > best_score {
            best = *lang;
            best_score = s;
        }
    }

    // A couple of incidental hits is not a detection
    if best_score < 3 {
        tracing::debug!(best_score, "content heuristics inconclusive");
        return Language::Unknown;
    }

    tracing::debug!(language = best.name(), best_score, "language from content heuristics");
    best
}
