//! Domain types shared by the lexical, dense and hybrid engines.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// An immutable span of a source document, the unit of retrieval.
///
/// - `chunk_id`: `"{source}_{ordinal}"`, unique within a store
/// - `source`: display name of the originating document
/// - `text`: the raw chunk text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub source: String,
    pub text: String,
}

impl Chunk {
    pub fn new(source: &str, ordinal: usize, text: impl Into<String>) -> Self {
        Self { chunk_id: chunk_id(source, ordinal), source: source.to_string(), text: text.into() }
    }
}

/// Deterministic chunk identifier for the `ordinal`-th chunk of `source`.
pub fn chunk_id(source: &str, ordinal: usize) -> ChunkId {
    format!("{source}_{ordinal}")
}

/// Indicates which index produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Dense,
    Lexical,
}

/// A retrieved chunk with the score its index assigned.
///
/// `score` is engine-specific but higher is always better. For dense hits
/// it is `1 / (1 + l2_distance)`, for lexical hits the BM25 score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
    pub source: SourceKind,
}
