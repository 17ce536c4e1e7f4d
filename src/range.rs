//! Line spans and the line equality rule shared by every comparison.
//!
//! Two conventions exist and each has its own type: [`LineRange`] is the
//! 1-based span stored with a captured reference, [`DocumentLineRange`] is
//! the 0-based span used against an open document. Conversions only happen
//! through the methods below.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 1-based inclusive span of lines, as captured.
///
/// Deserializing goes through [`LineRange::new`], so stored references
/// with a zero or inverted range are rejected on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StoredLineRange")]
pub struct LineRange {
    pub from: usize,
    pub to: usize,
}

#[derive(Deserialize)]
struct StoredLineRange {
    from: usize,
    to: usize,
}

impl TryFrom<StoredLineRange> for LineRange {
    type Error = Error;

    fn try_from(stored: StoredLineRange) -> Result<Self> {
        LineRange::new(stored.from, stored.to)
    }
}

impl LineRange {
    pub fn new(from: usize, to: usize) -> Result<Self> {
        if from == 0 || from > to {
            return Err(Error::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Number of lines after the first one.
    pub fn span(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn to_indexes(self) -> DocumentLineRange {
        DocumentLineRange {
            from_index: self.from.saturating_sub(1),
            to_index: self.to.saturating_sub(1),
        }
    }
}

/// 0-based inclusive span of line indexes inside an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentLineRange {
    pub from_index: usize,
    pub to_index: usize,
}

impl DocumentLineRange {
    pub fn new(from_index: usize, to_index: usize) -> Self {
        Self { from_index, to_index }
    }

    /// Range of `span + 1` lines starting at `from_index`.
    pub fn starting_at(from_index: usize, span: usize) -> Self {
        Self {
            from_index,
            to_index: from_index.saturating_add(span),
        }
    }

    pub fn span(&self) -> usize {
        self.to_index.saturating_sub(self.from_index)
    }

    pub fn line_count(&self) -> usize {
        self.span() + 1
    }

    pub fn to_line_range(self) -> LineRange {
        LineRange {
            from: self.from_index.saturating_add(1),
            to: self.to_index.saturating_add(1),
        }
    }
}

/// Literal text of the first and last line of a captured span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineContent {
    pub first: String,
    pub last: String,
}

impl LineContent {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
        }
    }

    /// Fingerprint of a captured snippet. `None` for an empty snippet.
    pub fn from_snippet(snippet: &str) -> Option<Self> {
        let mut lines = snippet.lines();
        let first = lines.next()?;
        let last = lines.last().unwrap_or(first);
        Some(Self::new(first, last))
    }
}

/// Lines match when both exist and are equal after trimming both ends.
pub fn lines_match(expected: Option<&str>, actual: Option<&str>) -> bool {
    match (expected, actual) {
        (Some(expected), Some(actual)) => expected.trim() == actual.trim(),
        _ => false,
    }
}
