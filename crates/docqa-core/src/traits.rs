use std::path::Path;

use crate::error::Result;

/// Maps text to fixed-dimension dense vectors.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embeds a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| crate::error::Error::Embedding("embedder returned no vector".into()))
    }
}

/// Produces an answer to `question` from `context` only.
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, question: &str, context: &str) -> Result<String>;
}

/// One strategy for turning a file into plain text.
pub trait DocumentExtractor: Send + Sync {
    fn name(&self) -> &str;
    fn can_extract(&self, path: &Path) -> bool;
    fn extract(&self, path: &Path) -> Result<String>;
}
