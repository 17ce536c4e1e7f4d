//! Turning a stored snippet reference into the range a command should act on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::DocumentManager;
use crate::locator::{LocateResult, Locator};
use crate::patch::snippet_matches;
use crate::range::{DocumentLineRange, LineContent, LineRange};

/// A reference to code as stored in a notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetReference {
    pub path: PathBuf,
    pub line_range: Option<LineRange>,
    pub line_content: Option<LineContent>,
}

impl SnippetReference {
    /// Reference to a whole file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line_range: None,
            line_content: None,
        }
    }

    pub fn lines(path: impl Into<PathBuf>, line_range: LineRange, line_content: LineContent) -> Self {
        Self {
            path: path.into(),
            line_range: Some(line_range),
            line_content: Some(line_content),
        }
    }
}

/// What the caller is about to do with the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceAction<'a> {
    /// Open and highlight the snippet.
    Select,
    /// Replace the snippet. `original_text` is the full text the patch was
    /// made against and must still be present line for line.
    ApplyPatch { original_text: &'a str },
}

impl ReferenceAction<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceAction::Select => "select",
            ReferenceAction::ApplyPatch { .. } => "apply-patch",
        }
    }
}

/// Sent to observers when a selected snippet was found at a new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationNotice {
    pub path: PathBuf,
    pub original: LineRange,
    pub relocated: DocumentLineRange,
}

pub trait RelocationObserver: Send + Sync {
    fn relocated(&self, notice: &RelocationNotice);
}

pub struct ReferenceResolver<M> {
    locator: Locator<M>,
    observers: Vec<Arc<dyn RelocationObserver>>,
}

impl<M: DocumentManager> ReferenceResolver<M> {
    pub fn new(locator: Locator<M>) -> Self {
        Self {
            locator,
            observers: Vec::new(),
        }
    }

    pub fn locator(&self) -> &Locator<M> {
        &self.locator
    }

    pub fn subscribe(&mut self, observer: Arc<dyn RelocationObserver>) {
        self.observers.push(observer);
    }

    /// Locate `reference` and check it is fit for `action`.
    ///
    /// A patch whose original text no longer matches the located snippet
    /// comes back as [`LocateResult::RangeNotFound`].
    pub async fn resolve(
        &self,
        reference: &SnippetReference,
        action: ReferenceAction<'_>,
    ) -> LocateResult {
        let result = self
            .locator
            .locate(
                &reference.path,
                reference.line_range,
                reference.line_content.as_ref(),
            )
            .await;

        match (&result, reference.line_range) {
            (LocateResult::Relocated { range, .. }, Some(original))
                if action == ReferenceAction::Select =>
            {
                self.notify(&reference.path, original, *range);
            }
            _ => {}
        }

        if let ReferenceAction::ApplyPatch { original_text } = action {
            if let Some(snippet) = result.snippet() {
                if !snippet_matches(original_text, snippet) {
                    log::debug!(
                        "{}: located snippet differs from the patch's original text",
                        reference.path.display()
                    );
                    return LocateResult::RangeNotFound;
                }
            }
        }

        result
    }

    fn notify(&self, path: &Path, original: LineRange, relocated: DocumentLineRange) {
        let notice = RelocationNotice {
            path: path.to_path_buf(),
            original,
            relocated,
        };
        for observer in &self.observers {
            observer.relocated(&notice);
        }
    }
}
