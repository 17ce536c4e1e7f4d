//! Applying a patch to a located snippet.

use std::io;

use similar::{ChangeTag, TextDiff};

use crate::document::{DocumentManager, DocumentReader, TextDocument};
use crate::error::{Error, Result};
use crate::locator::LocateResult;
use crate::range::{lines_match, DocumentLineRange};
use crate::resolve::{ReferenceAction, ReferenceResolver, SnippetReference};

/// True when both texts have the same number of lines and every pair of
/// lines matches after trimming.
pub fn snippet_matches(original_text: &str, snippet: &str) -> bool {
    let original: Vec<&str> = original_text.lines().collect();
    let current: Vec<&str> = snippet.lines().collect();

    original.len() == current.len()
        && original
            .iter()
            .zip(&current)
            .all(|(a, b)| lines_match(Some(*a), Some(*b)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchLineKind {
    Removed,
    Unchanged,
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLine {
    pub kind: PatchLineKind,
    pub content: String,
}

impl PatchLine {
    pub fn removed(content: impl Into<String>) -> Self {
        Self {
            kind: PatchLineKind::Removed,
            content: content.into(),
        }
    }

    pub fn unchanged(content: impl Into<String>) -> Self {
        Self {
            kind: PatchLineKind::Unchanged,
            content: content.into(),
        }
    }

    pub fn added(content: impl Into<String>) -> Self {
        Self {
            kind: PatchLineKind::Added,
            content: content.into(),
        }
    }
}

/// Line diff from `original` to `updated`.
pub fn patch_lines(original: &str, updated: &str) -> Vec<PatchLine> {
    let original = with_final_newline(original);
    let updated = with_final_newline(updated);
    let diff = TextDiff::from_lines(original.as_str(), updated.as_str());

    diff.iter_all_changes()
        .map(|change| {
            let content = change.value().trim_end_matches(|c: char| c == '\n' || c == '\r');
            match change.tag() {
                ChangeTag::Equal => PatchLine::unchanged(content),
                ChangeTag::Insert => PatchLine::added(content),
                ChangeTag::Delete => PatchLine::removed(content),
            }
        })
        .collect()
}

fn with_final_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}

/// Range the patched text occupies once applied at `from_index`, and the
/// indexes of added lines relative to that range.
///
/// ```text
///   function greet() {
/// -   console.log("Hello");
/// +   console.log("Hello, world.");
///     return;
///   }
/// ```
/// covers four lines with the added line at index 1.
pub fn final_range(from_index: usize, lines: &[PatchLine]) -> (DocumentLineRange, Vec<usize>) {
    let kept: Vec<&PatchLine> = lines
        .iter()
        .filter(|l| l.kind != PatchLineKind::Removed)
        .collect();

    let added = kept
        .iter()
        .enumerate()
        .filter(|(_, l)| l.kind == PatchLineKind::Added)
        .map(|(i, _)| i)
        .collect();

    let span = kept.len().saturating_sub(1);
    (DocumentLineRange::starting_at(from_index, span), added)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub reference: SnippetReference,
    /// Text the patch was made against.
    pub original_text: String,
    /// Replacement text, without a trailing newline.
    pub updated_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied {
        range: DocumentLineRange,
        added_lines: Vec<usize>,
        relocated: bool,
    },
    /// The original text is no longer there.
    NotApplied,
    FileNotFound,
}

/// Validate the reference and rewrite the file on disk with the patch.
pub async fn apply_patch<M: DocumentManager>(
    resolver: &ReferenceResolver<M>,
    request: &PatchRequest,
) -> Result<PatchOutcome> {
    let action = ReferenceAction::ApplyPatch {
        original_text: &request.original_text,
    };
    let result = resolver.resolve(&request.reference, action).await;

    let (range, relocated) = match result {
        LocateResult::Found { range, .. } => (range, false),
        LocateResult::Relocated { range, .. } => (range, true),
        LocateResult::RangeNotFound => return Ok(PatchOutcome::NotApplied),
        LocateResult::FileNotFound => return Ok(PatchOutcome::FileNotFound),
        LocateResult::FileOnlyFound => {
            return Err(Error::UnexpectedResult {
                action: action.name(),
                result: result.to_string(),
            })
        }
    };

    let path = &request.reference.path;
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PatchOutcome::FileNotFound),
        Err(e) => return Err(e.into()),
    };

    // The located snippet may come from an unsaved buffer; only write over
    // lines that still hold the original text on disk.
    let doc = TextDocument::new(&text);
    if !snippet_matches(&request.original_text, &doc.snippet(range)) {
        log::warn!(
            "not patching {}: file on disk differs from the located snippet",
            path.display()
        );
        return Ok(PatchOutcome::NotApplied);
    }

    let updated = request
        .updated_text
        .strip_suffix('\n')
        .unwrap_or(&request.updated_text);
    tokio::fs::write(path, doc.replace_lines(range, updated)).await?;

    let lines = patch_lines(&request.original_text, updated);
    let (range, added_lines) = final_range(range.from_index, &lines);
    log::info!(
        "applied patch to {} lines {}-{}",
        path.display(),
        range.from_index.saturating_add(1),
        range.to_index.saturating_add(1)
    );

    Ok(PatchOutcome::Applied {
        range,
        added_lines,
        relocated,
    })
}
