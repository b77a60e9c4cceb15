use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use docqa_core::types::{Chunk, SearchHit};
use docqa_core::Result;

use crate::store::{HybridStore, StoreStats};

/// Cloneable handle to one [`HybridStore`] behind a read-write lock.
///
/// Searches share the read lock; `add`, `reset` and `load` take the write
/// lock, so a search never observes a half-applied mutation.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<HybridStore>>,
}

impl SharedStore {
    pub fn new(store: HybridStore) -> Self {
        Self { inner: Arc::new(RwLock::new(store)) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, HybridStore> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, HybridStore> {
        self.inner.write()
    }

    pub fn add(&self, vectors: Vec<Vec<f32>>, chunks: Vec<Chunk>) -> Result<()> {
        self.inner.write().add(vectors, chunks)
    }

    pub fn reset(&self) -> Result<()> {
        self.inner.write().reset()
    }

    pub fn load(&self) -> Result<()> {
        self.inner.write().load()
    }

    pub fn hybrid_search(&self, query_vector: &[f32], query_text: &str, top_k: usize) -> Result<Vec<Chunk>> {
        self.inner.read().hybrid_search(query_vector, query_text, top_k)
    }

    pub fn hybrid_search_hits(&self, query_vector: &[f32], query_text: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        self.inner.read().hybrid_search_hits(query_vector, query_text, top_k)
    }

    pub fn dim(&self) -> usize {
        self.inner.read().dim()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.read().stats()
    }
}

impl From<HybridStore> for SharedStore {
    fn from(store: HybridStore) -> Self {
        Self::new(store)
    }
}
