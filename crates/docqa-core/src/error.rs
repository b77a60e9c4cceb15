use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Dimension mismatch: store expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Length mismatch: {vectors} vectors for {chunks} chunks")]
    LengthMismatch { vectors: usize, chunks: usize },

    #[error("Failed to extract text from {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Persistence failed for {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Lexical index error: {0}")]
    Index(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

impl Error {
    pub fn persistence(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Persistence { path: path.into(), reason: reason.to_string() }
    }

    pub fn extraction(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Extraction { path: path.into(), reason: reason.to_string() }
    }

    /// True for the errors the taxonomy treats as configuration problems.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::DimensionMismatch { .. } | Self::LengthMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
