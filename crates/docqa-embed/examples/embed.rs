use docqa_core::traits::Embedder;
use docqa_embed::HashEmbedder;

fn main() -> anyhow::Result<()> {
    let embedder = HashEmbedder::new(384)?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
