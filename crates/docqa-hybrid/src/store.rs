use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use docqa_core::config::StoreSettings;
use docqa_core::types::{Chunk, SearchHit, SourceKind};
use docqa_core::{Error, Result};
use docqa_text::LexicalIndex;
use docqa_vector::{nearest, remove_if_exists, write_atomic, DenseArtifact};

use crate::merge::rank_union;

/// A chunk and its embedding, kept together so the two can never drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub chunks: usize,
    pub sources: usize,
    pub dim: usize,
}

/// Dense and lexical retrieval over one ordered corpus of chunks.
///
/// Position `i` is the `i`-th chunk ever added. The lexical index exists only
/// while the store is populated and is always rebuilt from the full record
/// list. Every `add` persists the store; callers serialize mutation (see
/// [`crate::SharedStore`]).
pub struct HybridStore {
    dim: usize,
    index_path: PathBuf,
    meta_path: PathBuf,
    records: Vec<StoredChunk>,
    lexical: Option<LexicalIndex>,
}

impl HybridStore {
    pub fn new(dim: usize, index_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("store dimension must be greater than 0".into()));
        }
        Ok(Self { dim, index_path: index_path.into(), meta_path: meta_path.into(), records: Vec::new(), lexical: None })
    }

    /// Builds a store from settings and restores persisted state if present.
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        let mut store = Self::new(settings.dim, settings.index_path(), settings.meta_path())?;
        store.load()?;
        Ok(store)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.records.iter().map(|r| &r.chunk)
    }

    pub fn records(&self) -> &[StoredChunk] {
        &self.records
    }

    pub fn stats(&self) -> StoreStats {
        let sources: BTreeSet<&str> = self.chunks().map(|c| c.source.as_str()).collect();
        StoreStats { chunks: self.len(), sources: sources.len(), dim: self.dim }
    }

    /// Appends chunks with their vectors, rebuilds the lexical index and
    /// persists.
    ///
    /// Inputs are validated before anything changes. A persistence failure
    /// is returned after the in-memory store has already advanced.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>, chunks: Vec<Chunk>) -> Result<()> {
        if vectors.len() != chunks.len() {
            return Err(Error::LengthMismatch { vectors: vectors.len(), chunks: chunks.len() });
        }
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: v.len() });
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let texts = self.chunks().chain(chunks.iter()).map(|c| c.text.as_str());
        let lexical = LexicalIndex::build(texts)?;
        let added = chunks.len();
        self.records.extend(chunks.into_iter().zip(vectors).map(|(chunk, vector)| StoredChunk { chunk, vector }));
        self.lexical = Some(lexical);
        debug!(added, total = self.len(), "Added chunks to store");

        self.save()
    }

    pub fn search_dense(&self, query: &[f32], top_k: usize) -> Result<Vec<Chunk>> {
        Ok(into_chunks(self.search_dense_hits(query, top_k)?))
    }

    pub fn search_lexical(&self, query: &str, top_k: usize) -> Result<Vec<Chunk>> {
        Ok(into_chunks(self.search_lexical_hits(query, top_k)?))
    }

    pub fn hybrid_search(&self, query_vector: &[f32], query_text: &str, top_k: usize) -> Result<Vec<Chunk>> {
        Ok(into_chunks(self.hybrid_search_hits(query_vector, query_text, top_k)?))
    }

    /// Nearest chunks by L2 distance, scored `1 / (1 + distance)`.
    pub fn search_dense_hits(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let neighbors = nearest(query, self.records.iter().map(|r| r.vector.as_slice()), top_k);
        Ok(neighbors
            .into_iter()
            .map(|n| SearchHit {
                chunk: self.records[n.position].chunk.clone(),
                score: 1.0 / (1.0 + n.distance),
                source: SourceKind::Dense,
            })
            .collect())
    }

    pub fn search_lexical_hits(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let Some(lexical) = &self.lexical else {
            return Ok(Vec::new());
        };
        let matches = lexical.search(query, top_k)?;
        Ok(matches
            .into_iter()
            .filter_map(|m| {
                self.records.get(m.position).map(|r| SearchHit {
                    chunk: r.chunk.clone(),
                    score: m.score,
                    source: SourceKind::Lexical,
                })
            })
            .collect())
    }

    /// Dense hits first, then lexical hits, deduplicated by chunk id and
    /// truncated to `top_k`.
    pub fn hybrid_search_hits(&self, query_vector: &[f32], query_text: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let dense = self.search_dense_hits(query_vector, top_k)?;
        let lexical = self.search_lexical_hits(query_text, top_k)?;
        Ok(rank_union(dense, lexical, top_k))
    }

    /// Empties the store and deletes both artifacts. Safe to repeat.
    pub fn reset(&mut self) -> Result<()> {
        self.records.clear();
        self.lexical = None;
        remove_if_exists(&self.index_path)?;
        remove_if_exists(&self.meta_path)?;
        info!(dir = %self.index_path.parent().unwrap_or(Path::new(".")).display(), "Store reset");
        Ok(())
    }

    /// Writes the dense artifact, then the metadata artifact.
    pub fn save(&self) -> Result<()> {
        let dense = DenseArtifact::from_rows(self.dim, self.records.iter().map(|r| r.vector.as_slice()))?;
        dense.write(&self.index_path)?;
        let chunks: Vec<&Chunk> = self.chunks().collect();
        let meta = serde_json::to_vec(&chunks).map_err(|e| Error::persistence(&self.meta_path, e))?;
        write_atomic(&self.meta_path, &meta)?;
        debug!(chunks = self.len(), path = %self.meta_path.display(), "Persisted store");
        Ok(())
    }

    /// Replaces the in-memory state with the persisted one.
    ///
    /// When either artifact is missing the store becomes empty. Unreadable or
    /// inconsistent artifacts are an error and leave the store untouched.
    pub fn load(&mut self) -> Result<()> {
        if !(self.index_path.exists() && self.meta_path.exists()) {
            if self.index_path.exists() || self.meta_path.exists() {
                warn!(
                    index = %self.index_path.display(),
                    meta = %self.meta_path.display(),
                    "Only one store artifact present; starting empty"
                );
            }
            self.records.clear();
            self.lexical = None;
            return Ok(());
        }

        let dense = DenseArtifact::read(&self.index_path)?
            .ok_or_else(|| Error::persistence(&self.index_path, "artifact disappeared during load"))?;
        if dense.dim != self.dim {
            return Err(Error::persistence(
                &self.index_path,
                format!("stored dimension {} does not match configured {}", dense.dim, self.dim),
            ));
        }
        let bytes = fs::read(&self.meta_path).map_err(|e| Error::persistence(&self.meta_path, e))?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&bytes).map_err(|e| Error::persistence(&self.meta_path, e))?;
        if chunks.len() != dense.len() {
            return Err(Error::persistence(
                &self.meta_path,
                format!("{} metadata records for {} vectors", chunks.len(), dense.len()),
            ));
        }

        let lexical = if chunks.is_empty() {
            None
        } else {
            Some(LexicalIndex::build(chunks.iter().map(|c| c.text.as_str()))?)
        };
        self.records = chunks
            .into_iter()
            .zip(dense.into_rows())
            .map(|(chunk, vector)| StoredChunk { chunk, vector })
            .collect();
        self.lexical = lexical;
        info!(chunks = self.len(), path = %self.meta_path.display(), "Loaded store");
        Ok(())
    }
}

fn into_chunks(hits: Vec<SearchHit>) -> Vec<Chunk> {
    hits.into_iter().map(|h| h.chunk).collect()
}
