//! Error types for loading and serving promotions

use std::io;
use std::num::ParseFloatError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The source file could not be opened or read
    #[error("source {} unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source stream failed mid-read
    #[error("failed to read source: {0}")]
    Read(#[source] io::Error),

    /// A line could not be turned into a record
    #[error("malformed record at line {line}: {kind}")]
    MalformedRecord { line: usize, kind: MalformedKind },

    /// An uploaded source could not be written to disk
    #[error("failed to persist source {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),
}

/// Why a single source line was rejected
#[derive(Debug, Error)]
pub enum MalformedKind {
    #[error("expected 3 fields, found {found}")]
    MissingFields { found: usize },

    #[error("invalid price {value:?}: {source}")]
    InvalidPrice {
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("line is not valid UTF-8")]
    InvalidEncoding,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error was caused by the contents of a source rather than
    /// by the environment
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedRecord { .. })
    }
}
