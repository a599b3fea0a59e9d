//! Source positions and spans.
//!
//! Every token, syntax node and symbol carries a position. Lines and columns
//! are 1-based for display; byte offsets are 0-based.

use serde::{Deserialize, Serialize};

/// A 1-based line/column pair.
///
/// Ordering is lexicographic on `(line, column)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TextPosition {
    pub line: u32,
    pub column: u32,
}

impl TextPosition {
    pub const fn new(line: u32, column: u32) -> Self {
        TextPosition { line, column }
    }
}

impl std::fmt::Display for TextPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An immutable source range.
///
/// `end_column` is exclusive: a one-character token at column 5 spans
/// columns 5..6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Default for Span {
    fn default() -> Self {
        Span::point(0, 1, 1)
    }
}

impl Span {
    pub fn new(
        start_offset: usize,
        end_offset: usize,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        debug_assert!(start_offset <= end_offset, "span start after end");
        Span {
            start_offset,
            end_offset,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// A zero-width span at the given location.
    pub fn point(offset: usize, line: u32, column: u32) -> Self {
        Span::new(offset, offset, line, column, line, column)
    }

    pub fn start(&self) -> TextPosition {
        TextPosition::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> TextPosition {
        TextPosition::new(self.end_line, self.end_column)
    }

    pub fn is_multiline(&self) -> bool {
        self.start_line != self.end_line
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }

    /// Zero-width span at this span's start.
    pub fn start_point(&self) -> Span {
        Span::point(self.start_offset, self.start_line, self.start_column)
    }

    /// Zero-width span at this span's end.
    pub fn end_point(&self) -> Span {
        Span::point(self.end_offset, self.end_line, self.end_column)
    }

    /// Span from `self`'s start to `other`'s end.
    ///
    /// Callers pass spans in source order; the result is only well formed
    /// when `other` does not end before `self` starts.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start_offset: self.start_offset,
            end_offset: other.end_offset.max(self.start_offset),
            start_line: self.start_line,
            start_column: self.start_column,
            end_line: other.end_line,
            end_column: other.end_column,
        }
    }

    /// Inclusive lexicographic containment of a line/column position.
    ///
    /// Interior lines only need the line bounds; the start line checks the
    /// start column and the end line checks the end column.
    pub fn contains(&self, position: TextPosition) -> bool {
        if position.line < self.start_line || position.line > self.end_line {
            return false;
        }
        if position.line == self.start_line && position.column < self.start_column {
            return false;
        }
        if position.line == self.end_line && position.column > self.end_column {
            return false;
        }
        true
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start(), self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn span(sl: u32, sc: u32, el: u32, ec: u32) -> Span {
        Span::new(0, 0, sl, sc, el, ec)
    }

    #[test]
    fn single_line_span_checks_both_columns() {
        let s = span(3, 5, 3, 10);
        assert!(!s.contains(TextPosition::new(3, 4)));
        assert!(s.contains(TextPosition::new(3, 5)));
        assert!(s.contains(TextPosition::new(3, 10)));
        assert!(!s.contains(TextPosition::new(3, 11)));
        assert!(!s.contains(TextPosition::new(2, 7)));
        assert!(!s.contains(TextPosition::new(4, 7)));
    }

    #[test]
    fn multiline_span_interior_lines_ignore_columns() {
        let s = span(2, 8, 6, 2);
        assert!(s.contains(TextPosition::new(4, 1)));
        assert!(s.contains(TextPosition::new(4, 500)));
        // start line: column must be at or after the start column
        assert!(s.contains(TextPosition::new(2, 8)));
        assert!(s.contains(TextPosition::new(2, 80)));
        assert!(!s.contains(TextPosition::new(2, 7)));
        // end line: column must be at or before the end column
        assert!(s.contains(TextPosition::new(6, 1)));
        assert!(s.contains(TextPosition::new(6, 2)));
        assert!(!s.contains(TextPosition::new(6, 3)));
    }

    #[test]
    fn zero_width_span_contains_only_its_point() {
        let s = Span::point(10, 4, 7);
        assert!(s.contains(TextPosition::new(4, 7)));
        assert!(!s.contains(TextPosition::new(4, 6)));
        assert!(!s.contains(TextPosition::new(4, 8)));
        assert!(s.is_empty());
        assert!(!s.is_multiline());
    }

    #[test]
    fn merge_takes_start_of_first_and_end_of_second() {
        let a = Span::new(0, 5, 1, 1, 1, 6);
        let b = Span::new(10, 14, 2, 3, 2, 7);
        let m = a.merge(&b);
        assert_eq!(m.start_offset, 0);
        assert_eq!(m.end_offset, 14);
        assert_eq!(m.start(), TextPosition::new(1, 1));
        assert_eq!(m.end(), TextPosition::new(2, 7));
        assert!(m.is_multiline());
    }

    #[test]
    fn merge_of_points_spans_the_gap() {
        let prev = Span::new(0, 3, 1, 1, 1, 4).end_point();
        let next = Span::new(7, 9, 2, 2, 2, 4).start_point();
        let gap = prev.merge(&next);
        assert_eq!(gap.start_offset, 3);
        assert_eq!(gap.end_offset, 7);
        assert_eq!(gap.start(), TextPosition::new(1, 4));
        assert_eq!(gap.end(), TextPosition::new(2, 2));
    }

    fn reference_contains(s: &Span, p: TextPosition) -> bool {
        let start = (s.start_line, s.start_column);
        let end = (s.end_line, s.end_column);
        let p = (p.line, p.column);
        start <= p && p <= end
    }

    fn ordered_span() -> impl Strategy<Value = Span> {
        (1u32..20, 1u32..20, 0u32..5, 1u32..20).prop_map(|(sl, sc, dl, ec)| {
            let el = sl + dl;
            let ec = if dl == 0 { sc.max(ec) } else { ec };
            Span::new(0, 0, sl, sc, el, ec)
        })
    }

    proptest! {
        #[test]
        fn contains_agrees_with_lexicographic_reference(
            s in ordered_span(),
            line in 0u32..30,
            column in 0u32..30,
        ) {
            let p = TextPosition::new(line, column);
            prop_assert_eq!(s.contains(p), reference_contains(&s, p));
        }

        #[test]
        fn merge_is_associative_for_ordered_spans(
            a in 0usize..50, b in 0usize..50, c in 0usize..50, d in 0usize..50,
        ) {
            let mut offsets = [a, b, c, d];
            offsets.sort_unstable();
            let mk = |s: usize, e: usize| Span::new(s, e, 1, s as u32 + 1, 1, e as u32 + 1);
            let x = mk(offsets[0], offsets[1]);
            let y = mk(offsets[1], offsets[2]);
            let z = mk(offsets[2], offsets[3]);
            prop_assert_eq!(x.merge(&y).merge(&z), x.merge(&y.merge(&z)));
            prop_assert_eq!(x.merge(&z).start(), x.start());
            prop_assert_eq!(x.merge(&z).end(), z.end());
        }
    }
}
