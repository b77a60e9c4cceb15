use docqa_core::config::{EmbedderKind, EmbedderSettings};
use docqa_core::traits::Embedder;
use docqa_embed::{build_embedder, HashEmbedder};

fn hash_settings() -> EmbedderSettings {
    EmbedderSettings { kind: EmbedderKind::Hash, ..EmbedderSettings::default() }
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = build_embedder(&hash_settings(), 384).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_are_closer_than_disjoint_ones() {
    let embedder = HashEmbedder::new(256).expect("embedder");
    let a = embedder.embed_text("rust ownership borrowing");
    let b = embedder.embed_text("rust ownership lifetimes");
    let c = embedder.embed_text("gardening tomatoes compost");
    let l2 = |x: &[f32], y: &[f32]| x.iter().zip(y).map(|(p, q)| (p - q).powi(2)).sum::<f32>();
    assert!(l2(&a, &b) < l2(&a, &c));
}

#[test]
fn embed_one_matches_batch() {
    let embedder = HashEmbedder::new(64).expect("embedder");
    let single = embedder.embed_one("what is x").expect("embed_one");
    let batch = embedder.embed_batch(&["what is x".to_string()]).expect("batch");
    assert_eq!(single, batch[0]);
}

#[test]
fn missing_model_dir_is_reported() {
    let settings = EmbedderSettings { model_dir: Some("/nonexistent/model".into()), ..EmbedderSettings::default() };
    let err = build_embedder(&settings, 384).err().expect("must fail");
    assert!(err.to_string().contains("/nonexistent/model"));
}

#[test]
fn zero_dimension_hash_embedder_is_configuration_error() {
    let err = build_embedder(&hash_settings(), 0).err().expect("must fail");
    let core = err.downcast_ref::<docqa_core::Error>().expect("core error");
    assert!(core.is_configuration());
}
