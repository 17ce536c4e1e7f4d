//! Read access to text documents.
//!
//! The locator never touches the filesystem itself: it asks a
//! [`DocumentManager`] for a [`DocumentReader`] and works against that
//! snapshot until the call completes.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use crate::range::DocumentLineRange;

/// Read-only view of a text buffer. Indexes are 0-based.
pub trait DocumentReader {
    fn line_count(&self) -> usize;

    fn line_at(&self, index: usize) -> Option<&str>;

    /// Text of the lines in `range`, joined with the document's line
    /// ending. Lines past the end of the document are left out.
    fn snippet(&self, range: DocumentLineRange) -> String;
}

/// Opens documents by path. `None` means the file is missing or unreadable.
pub trait DocumentManager {
    type Reader: DocumentReader;

    fn open(&self, path: &Path) -> impl Future<Output = Option<Self::Reader>> + Send;
}

/// Owned snapshot of a document split into lines.
///
/// Line counting follows editor semantics: a trailing newline starts an
/// empty last line, and an empty text still has one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    lines: Vec<String>,
    eol: &'static str,
}

impl TextDocument {
    pub fn new(text: &str) -> Self {
        let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
        Self {
            lines: split_lines(text),
            eol,
        }
    }

    pub fn eol(&self) -> &'static str {
        self.eol
    }

    pub fn text(&self) -> String {
        self.lines.join(self.eol)
    }

    /// Full document text with the lines of `range` replaced by `replacement`.
    ///
    /// The line ending that followed the range is kept, so the replacement
    /// should not carry a trailing newline of its own.
    pub fn replace_lines(&self, range: DocumentLineRange, replacement: &str) -> String {
        let len = self.lines.len();
        let start = range.from_index.min(len);
        let end = range.to_index.saturating_add(1).clamp(start, len);

        let lines: Vec<&str> = self.lines[..start]
            .iter()
            .map(String::as_str)
            .chain(replacement.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)))
            .chain(self.lines[end..].iter().map(String::as_str))
            .collect();

        lines.join(self.eol)
    }
}

impl DocumentReader for TextDocument {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_at(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    fn snippet(&self, range: DocumentLineRange) -> String {
        if range.from_index >= self.lines.len() || range.from_index > range.to_index {
            return String::new();
        }
        let to = range.to_index.min(self.lines.len() - 1);
        self.lines[range.from_index..=to].join(self.eol)
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Opens files from disk. Bytes that are not valid UTF-8 are replaced
/// with U+FFFD, so such a file still opens.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDocumentManager;

impl DocumentManager for FileDocumentManager {
    type Reader = TextDocument;

    async fn open(&self, path: &Path) -> Option<TextDocument> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Some(TextDocument::new(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("document {} does not exist", path.display());
                None
            }
            Err(e) => {
                log::warn!("failed to open document {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Documents held in memory, keyed by path. Stands in for unsaved editor
/// buffers.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentManager {
    documents: HashMap<PathBuf, String>,
}

impl MemoryDocumentManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.documents.insert(path.into(), text.into());
    }

    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.documents.remove(path)
    }
}

impl DocumentManager for MemoryDocumentManager {
    type Reader = TextDocument;

    async fn open(&self, path: &Path) -> Option<TextDocument> {
        self.documents.get(path).map(|text| TextDocument::new(text))
    }
}
