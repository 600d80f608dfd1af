//! Source spans.
//!
//! A span is a half-open `[start, end)` range of byte offsets into the
//! original source of a module. Spans drive diagnostics placement and
//! position-based symbol lookup.

use serde::{Deserialize, Serialize};

/// Half-open byte range into a module's source text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    /// Zero-length span at a single offset.
    pub fn at(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` falls inside this span.
    pub fn contains(self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether `other` is fully inside this span.
    pub fn contains_span(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two spans share at least one offset.
    pub fn overlaps(self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest span covering both.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Distance from `offset` to the nearest edge of the span, zero if inside.
    pub fn distance_to(self, offset: u32) -> u32 {
        if self.contains(offset) {
            0
        } else if offset < self.start {
            self.start - offset
        } else {
            offset - self.end + 1
        }
    }
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let span = Span::new(2, 5);
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
    }

    #[test]
    fn overlap_requires_shared_offset() {
        let a = Span::new(0, 4);
        let b = Span::new(3, 8);
        let c = Span::new(4, 8);
        assert!(a.overlaps(b));
        assert!(b.overlaps(a));
        assert!(!a.overlaps(c));
    }

    #[test]
    fn cover_spans_both() {
        let a = Span::new(4, 6);
        let b = Span::new(1, 5);
        assert_eq!(a.cover(b), Span::new(1, 6));
    }

    #[test]
    fn distance_is_zero_inside() {
        let span = Span::new(10, 20);
        assert_eq!(span.distance_to(15), 0);
        assert_eq!(span.distance_to(5), 5);
        assert_eq!(span.distance_to(25), 6);
    }
}
