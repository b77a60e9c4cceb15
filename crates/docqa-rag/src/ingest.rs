//! Turning documents into indexed chunks.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use docqa_core::chunker::Chunker;
use docqa_core::extract::ExtractorChain;
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;
use docqa_core::Result;
use docqa_hybrid::SharedStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub chunks_added: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IngestItem {
    Indexed { file_name: String, source: String, chunks_added: usize },
    Failed { file_name: String, error: String },
}

impl IngestItem {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Indexed { file_name, .. } | Self::Failed { file_name, .. } => file_name,
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<IngestItem>,
}

/// Display name of a document: its file name.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub struct Ingestor {
    extractor: ExtractorChain,
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    store: SharedStore,
    workers: usize,
}

impl Ingestor {
    pub fn new(extractor: ExtractorChain, chunker: Chunker, embedder: Arc<dyn Embedder>, store: SharedStore) -> Self {
        Self { extractor, chunker, embedder, store, workers: 1 }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Extracts, chunks, embeds and adds one document.
    pub fn build_index(&self, path: &Path) -> Result<IngestReport> {
        let (chunks, vectors) = self.prepare(path)?;
        self.commit(path, chunks, vectors)
    }

    fn prepare(&self, path: &Path) -> Result<(Vec<Chunk>, Vec<Vec<f32>>)> {
        let source = source_name(path);
        let text = self.extractor.extract(path)?;
        let chunks = self.chunker.chunk_document(&source, &text)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = if texts.is_empty() { Vec::new() } else { self.embedder.embed_batch(&texts)? };
        debug!(source = %source, chunks = chunks.len(), "Prepared document");
        Ok((chunks, vectors))
    }

    fn commit(&self, path: &Path, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<IngestReport> {
        let source = source_name(path);
        let chunks_added = chunks.len();
        self.store.add(vectors, chunks)?;
        info!(source = %source, chunks_added, "Indexed document");
        Ok(IngestReport { source, chunks_added })
    }

    pub fn ingest_many(&self, paths: &[PathBuf]) -> BatchReport {
        self.ingest_many_with(paths, |_| {})
    }

    /// Ingests `paths` on a pool of worker threads.
    ///
    /// Preparation runs in parallel; adds are serialized by the store's write
    /// lock. `on_item` is called as each document finishes. Results keep input
    /// order, and one document failing never stops the others. A panic in a
    /// collaborator propagates to the caller.
    pub fn ingest_many_with<F>(&self, paths: &[PathBuf], on_item: F) -> BatchReport
    where
        F: Fn(&IngestItem) + Sync,
    {
        let slots: Vec<Mutex<Option<IngestItem>>> = paths.iter().map(|_| Mutex::new(None)).collect();
        let next = AtomicUsize::new(0);
        let workers = self.workers.min(paths.len()).max(1);

        std::thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|| loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = paths.get(i) else { break };
                    let item = self.ingest_item(path);
                    on_item(&item);
                    *slots[i].lock() = Some(item);
                });
            }
        });

        // The scope re-raises any worker panic, so every slot is filled here.
        let results: Vec<IngestItem> = slots.into_iter().filter_map(|slot| slot.into_inner()).collect();
        let successful = results.iter().filter(|r| r.is_indexed()).count();
        info!(total = results.len(), successful, "Batch ingestion finished");
        BatchReport { total: results.len(), successful, failed: results.len() - successful, results }
    }

    fn ingest_item(&self, path: &Path) -> IngestItem {
        let file_name = source_name(path);
        match self.build_index(path) {
            Ok(report) => IngestItem::Indexed { file_name, source: report.source, chunks_added: report.chunks_added },
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to ingest document");
                IngestItem::Failed { file_name, error: e.to_string() }
            }
        }
    }
}
