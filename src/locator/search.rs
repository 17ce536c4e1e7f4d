use crate::document::DocumentReader;
use crate::range::lines_match;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Toward index 0.
    Above,
    /// Toward the last line.
    Below,
}

/// A matching line and its distance from the search origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineMatch {
    pub index: usize,
    pub distance: usize,
}

/// Scan from `origin` (inclusive) in `direction` for the first line matching
/// `expected` that `accept` also agrees with.
///
/// An origin past the end of the document starts the upward scan at the
/// last line; the downward scan then has nothing to visit.
pub(crate) fn find_line<R, F>(
    doc: &R,
    expected: &str,
    origin: usize,
    direction: Direction,
    max_distance: Option<usize>,
    accept: F,
) -> Option<LineMatch>
where
    R: DocumentReader + ?Sized,
    F: Fn(usize) -> bool,
{
    let last = doc.line_count().checked_sub(1)?;
    let within_reach = |index: usize| max_distance.map_or(true, |max| origin.abs_diff(index) <= max);
    let is_match = |index: usize| lines_match(Some(expected), doc.line_at(index)) && accept(index);

    let found = match direction {
        Direction::Above => (0..=origin.min(last))
            .rev()
            .take_while(|&i| within_reach(i))
            .find(|&i| is_match(i)),
        Direction::Below => (origin..=last)
            .take_while(|&i| within_reach(i))
            .find(|&i| is_match(i)),
    };

    found.map(|index| LineMatch {
        index,
        distance: origin.abs_diff(index),
    })
}

/// Closer match wins. Equal distances go to the match above.
pub(crate) fn nearest(above: Option<LineMatch>, below: Option<LineMatch>) -> Option<LineMatch> {
    match (above, below) {
        (Some(a), Some(b)) => Some(if a.distance <= b.distance { a } else { b }),
        (a, b) => a.or(b),
    }
}
