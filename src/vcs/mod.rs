//! Git access needed around the locator: which branch a reference was
//! captured on, switching to it, and who last touched the captured lines.

mod blame;
mod git;
#[cfg(test)]
pub mod test_utils;

pub use blame::BlameCommit;
pub use git::{GitIdentity, GitRepo, RefType};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("not a git repository")]
    NotARepository,

    #[error("invalid reference: {0}")]
    InvalidRef(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, VcsError>;
