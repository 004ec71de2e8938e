//! Source location types
//!
//! Spans carry byte offsets into the owning document plus 1-indexed
//! line numbers for display.

use serde::{Deserialize, Serialize};

/// Span in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: u32,
    pub end_line: u32,
}

impl Span {
    pub fn new(start_byte: usize, end_byte: usize, start_line: u32, end_line: u32) -> Self {
        Self {
            start_byte,
            end_byte,
            start_line,
            end_line,
        }
    }

    /// Create a zero span
    pub fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Byte length of the span
    pub fn len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strict containment check used by the extractor invariant:
    /// a child definition's span lies inside its parent's span
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    /// Disjointness check for sibling records at one nesting level
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }

    pub fn line_count(&self) -> u32 {
        if self.end_line >= self.start_line {
            self.end_line - self.start_line + 1
        } else {
            0
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains() {
        let parent = Span::new(0, 100, 1, 10);
        let child = Span::new(20, 60, 3, 6);
        assert!(parent.contains(&child));
        assert!(!child.contains(&parent));
    }

    #[test]
    fn test_span_overlaps() {
        let a = Span::new(0, 50, 1, 5);
        let b = Span::new(40, 80, 4, 8);
        let c = Span::new(50, 80, 5, 8);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_span_line_count() {
        let span = Span::new(0, 10, 10, 20);
        assert_eq!(span.line_count(), 11);
    }
}
