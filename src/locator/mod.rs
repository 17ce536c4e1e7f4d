//! Re-finding captured line ranges in files that may have changed since.
//!
//! A capture remembers a 1-based [`LineRange`] and the text of its first and
//! last lines. [`Locator::locate`] first checks whether that text is still
//! where it was; if not, it searches outward from the old position for the
//! first line and keeps the original span length.

mod search;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{DocumentManager, DocumentReader};
use crate::range::{lines_match, DocumentLineRange, LineContent, LineRange};
use search::{find_line, nearest, Direction};

/// Tuning for the relocation search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorOptions {
    /// Also require the last line of a relocated range to match.
    pub verify_last_line: bool,
    /// Furthest a relocated first line may be from its old position.
    /// Unset means the search runs to the edges of the file.
    pub max_distance: Option<usize>,
}

/// Outcome of a locate call. Ranges are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateResult {
    FileNotFound,
    /// No range or content was given, only the file was checked.
    FileOnlyFound,
    /// The file exists but the content was not found in it.
    RangeNotFound,
    Found {
        range: DocumentLineRange,
        snippet: String,
    },
    /// The content was found at a different position. Callers should treat
    /// this as less certain than [`LocateResult::Found`].
    Relocated {
        range: DocumentLineRange,
        snippet: String,
    },
}

impl LocateResult {
    pub fn tag(&self) -> &'static str {
        match self {
            LocateResult::FileNotFound => "file-not-found",
            LocateResult::FileOnlyFound => "file-only-found",
            LocateResult::RangeNotFound => "range-not-found",
            LocateResult::Found { .. } => "found",
            LocateResult::Relocated { .. } => "found-relocated",
        }
    }

    pub fn range(&self) -> Option<DocumentLineRange> {
        match self {
            LocateResult::Found { range, .. } | LocateResult::Relocated { range, .. } => {
                Some(*range)
            }
            _ => None,
        }
    }

    pub fn snippet(&self) -> Option<&str> {
        match self {
            LocateResult::Found { snippet, .. } | LocateResult::Relocated { snippet, .. } => {
                Some(snippet)
            }
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LocateResult::Found { .. } | LocateResult::Relocated { .. })
    }
}

impl fmt::Display for LocateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

pub struct Locator<M> {
    documents: M,
    options: LocatorOptions,
}

impl<M: DocumentManager> Locator<M> {
    pub fn new(documents: M) -> Self {
        Self::with_options(documents, LocatorOptions::default())
    }

    pub fn with_options(documents: M, options: LocatorOptions) -> Self {
        Self { documents, options }
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    pub fn documents(&self) -> &M {
        &self.documents
    }

    /// Resolve a captured range against the current contents of `path`.
    pub async fn locate(
        &self,
        path: &Path,
        line_range: Option<LineRange>,
        line_content: Option<&LineContent>,
    ) -> LocateResult {
        let Some(doc) = self.documents.open(path).await else {
            log::debug!("locate {}: file not found", path.display());
            return LocateResult::FileNotFound;
        };

        let (Some(line_range), Some(line_content)) = (line_range, line_content) else {
            return LocateResult::FileOnlyFound;
        };

        let result = locate_in(&doc, line_range, line_content, &self.options);
        log::debug!(
            "locate {} lines {}-{}: {}",
            path.display(),
            line_range.from,
            line_range.to,
            result
        );
        result
    }
}

/// Locate a captured range in an already opened document.
pub fn locate_in<R>(
    doc: &R,
    line_range: LineRange,
    line_content: &LineContent,
    options: &LocatorOptions,
) -> LocateResult
where
    R: DocumentReader + ?Sized,
{
    let range = line_range.to_indexes();
    let first = Some(line_content.first.as_str());
    let last = Some(line_content.last.as_str());

    if lines_match(doc.line_at(range.from_index), first)
        && lines_match(doc.line_at(range.to_index), last)
    {
        return LocateResult::Found {
            range,
            snippet: doc.snippet(range),
        };
    }

    match relocate(doc, range, line_content, options) {
        Some(range) => LocateResult::Relocated {
            range,
            snippet: doc.snippet(range),
        },
        None => LocateResult::RangeNotFound,
    }
}

fn relocate<R>(
    doc: &R,
    range: DocumentLineRange,
    line_content: &LineContent,
    options: &LocatorOptions,
) -> Option<DocumentLineRange>
where
    R: DocumentReader + ?Sized,
{
    let span = range.span();
    let last = Some(line_content.last.as_str());
    let accept = |index: usize| {
        !options.verify_last_line || lines_match(last, doc.line_at(index.saturating_add(span)))
    };

    let search = |direction| {
        find_line(
            doc,
            &line_content.first,
            range.from_index,
            direction,
            options.max_distance,
            &accept,
        )
    };
    let above = search(Direction::Above);
    let below = search(Direction::Below);

    let winner = nearest(above, below)?;
    log::debug!(
        "relocated line {} to {} (distance {})",
        range.from_index,
        winner.index,
        winner.distance
    );
    Some(DocumentLineRange::starting_at(winner.index, span))
}
