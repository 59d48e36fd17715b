//! Error type shared by the structures, the scan layer and the CLI.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Empty word, a character outside `[a-z0-9]` after case folding, or a
    /// zero occurrence count.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Node storage could not grow. Nothing was mutated.
    #[error("allocation failed: {0}")]
    AllocationFailure(#[from] TryReserveError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: expected `<word> <occurrences>`", .path.display())]
    MalformedLine { path: PathBuf, line: usize },
}

impl Error {
    pub(crate) fn invalid_word(word: &str) -> Self {
        if word.is_empty() {
            Error::InvalidArgument("empty word".to_string())
        } else {
            Error::InvalidArgument(format!("word {word:?} contains characters outside [a-z0-9]"))
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
