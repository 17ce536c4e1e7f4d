use thiserror::Error;
use crate::vcs::VcsError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid line range {from}..={to}: lines are 1-based and from must not exceed to")]
    InvalidRange { from: usize, to: usize },

    #[error("unexpected locate result for {action}: {result}")]
    UnexpectedResult { action: &'static str, result: String },

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
