//! docqa-embed
//!
//! Embedder implementations behind `docqa_core::traits::Embedder`: a local
//! BERT-family model on candle and a deterministic hashing embedder.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use docqa_core::config::{expand_path, EmbedderKind, EmbedderSettings};
use docqa_core::traits::Embedder;

mod bert;
pub mod device;
mod hash;
pub mod pool;
pub mod tokenize;

pub use bert::BertEmbedder;
pub use hash::HashEmbedder;
pub use pool::{cls_l2, masked_mean_l2};

const DEFAULT_MODEL: &str = "bge-small-en-v1.5";

/// Builds the configured embedder and checks it produces `dim`-length vectors.
pub fn build_embedder(settings: &EmbedderSettings, dim: usize) -> Result<Box<dyn Embedder>> {
    let embedder: Box<dyn Embedder> = match settings.kind {
        EmbedderKind::Hash => {
            info!(dim, "Using HashEmbedder");
            Box::new(HashEmbedder::new(dim)?)
        }
        EmbedderKind::Bert => {
            let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
            Box::new(BertEmbedder::load(&model_dir, settings.max_len, settings.pooling)?)
        }
    };
    if embedder.dim() != dim {
        return Err(docqa_core::Error::DimensionMismatch { expected: dim, actual: embedder.dim() }.into());
    }
    Ok(embedder)
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { info!(dir = %p.display(), "Using configured model dir"); return Ok(p); }
        return Err(anyhow!("Configured model directory does not exist: {}", p.display()));
    }
    if let Ok(dir) = std::env::var("MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() { info!(dir = %p.display(), "Using MODEL_DIR"); return Ok(p); }
    }
    for candidate in [Path::new("../models").join(DEFAULT_MODEL), Path::new("models").join(DEFAULT_MODEL)] {
        if candidate.exists() { info!(dir = %candidate.display(), "Using model dir"); return Ok(candidate); }
    }
    Err(anyhow!("Could not locate {} model directory; set embedder.model_dir", DEFAULT_MODEL))
}
