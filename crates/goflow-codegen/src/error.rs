use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("syntax error in {}", path.display())]
    Syntax { path: PathBuf },

    #[error("failed to load the Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("failed to list {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A record embeds itself through a chain of embedded fields.
    #[error("cyclic embedding: {}", chain.join(" -> "))]
    CyclicEmbedding { chain: Vec<String> },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output: {0}")]
    Sink(#[source] io::Error),
}

impl Error {
    /// Whether this error only affects a single input file.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::Syntax { .. })
    }
}
