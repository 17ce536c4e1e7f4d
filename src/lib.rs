//! Relocating captured code snippets in files that have changed since they
//! were captured.
//!
//! A notebook stores a reference to code as a file path, a 1-based line
//! range and the text of the range's first and last lines. The [`Locator`]
//! finds that content again, the [`resolve`] module checks it is fit for
//! what the caller is about to do, and [`patch`] applies edits to it.

pub mod branch;
pub mod config;
pub mod document;
mod error;
pub mod locator;
pub mod patch;
pub mod range;
pub mod resolve;
pub mod vcs;

pub use config::Config;
pub use document::{DocumentManager, DocumentReader, FileDocumentManager, TextDocument};
pub use error::{Error, Result};
pub use locator::{LocateResult, Locator, LocatorOptions};
pub use range::{lines_match, DocumentLineRange, LineContent, LineRange};
pub use resolve::{ReferenceAction, ReferenceResolver, SnippetReference};
