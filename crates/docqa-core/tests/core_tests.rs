use std::fs;
use std::io::Write;
use tempfile::TempDir;

use docqa_core::chunker::{ChunkParams, Chunker};
use docqa_core::extract::{list_documents, ExtractorChain};
use docqa_core::types::{chunk_id, Chunk};
use pretty_assertions::assert_eq;

#[test]
fn small_file_becomes_one_chunk() {
    let tmp = TempDir::new().unwrap();
    let file_path = tmp.path().join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let text = ExtractorChain::default().extract(&file_path).expect("extract");
    let chunker = Chunker::cl100k(ChunkParams::default()).expect("chunker");
    let chunks = chunker.chunk_document("a.txt", &text).expect("chunk");

    assert_eq!(chunks.len(), 1, "one small document becomes one chunk");
    assert_eq!(chunks[0].text.trim(), "Short text");
    assert_eq!(chunks[0].chunk_id, "a.txt_0");
}

#[test]
fn long_file_is_split_with_stable_ids() {
    let tmp = TempDir::new().unwrap();
    let body: String = (0..400).map(|i| format!("sentence number {i} about firecraft. ")).collect();
    fs::write(tmp.path().join("long.txt"), &body).unwrap();

    let files = list_documents(tmp.path());
    assert_eq!(files.len(), 1);
    let text = ExtractorChain::default().extract(&files[0]).expect("extract");
    let chunker = Chunker::cl100k(ChunkParams::new(100, 20).unwrap()).expect("chunker");
    let first = chunker.chunk_document("long.txt", &text).expect("chunk");
    let second = chunker.chunk_document("long.txt", &text).expect("chunk");

    assert!(first.len() > 1);
    assert_eq!(first, second, "chunking is deterministic");
    for (i, c) in first.iter().enumerate() {
        assert_eq!(c.chunk_id, chunk_id("long.txt", i));
    }
}

#[test]
fn chunk_serializes_with_field_names() {
    let chunk = Chunk::new("doc.txt", 2, "body");
    let json = serde_json::to_value(&chunk).unwrap();
    assert_eq!(json, serde_json::json!({"chunk_id": "doc.txt_2", "source": "doc.txt", "text": "body"}));
}
