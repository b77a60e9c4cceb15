//! Token-window chunking.
//!
//! Text is encoded to tokens, cut into windows of `chunk_size` tokens that
//! advance by `chunk_size - overlap`, and each window is decoded back to
//! text. Windowing is pure and deterministic; the tokenizer sits behind
//! [`TokenCodec`].

use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Converts between text and model tokens.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// Window size and overlap, both in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self { chunk_size: 500, overlap: 80 }
    }
}

impl ChunkParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let params = Self { chunk_size, overlap };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Cuts `tokens` into overlapping windows.
///
/// Every window but the last holds exactly `chunk_size` tokens and window
/// `i` starts at `i * stride`. The last window ends at the final token.
pub fn window_tokens(tokens: &[u32], params: ChunkParams) -> Result<Vec<&[u32]>> {
    params.validate()?;
    let mut windows = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + params.chunk_size).min(tokens.len());
        windows.push(&tokens[start..end]);
        if end == tokens.len() {
            break;
        }
        start += params.stride();
    }
    Ok(windows)
}

/// Splits `text` into decoded token windows.
pub fn chunk_text(
    codec: &dyn TokenCodec,
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>> {
    let params = ChunkParams::new(chunk_size, overlap)?;
    let tokens = codec.encode(text);
    window_tokens(&tokens, params)?.into_iter().map(|w| codec.decode(w)).collect()
}

/// A codec bound to fixed chunking parameters.
pub struct Chunker {
    codec: Box<dyn TokenCodec>,
    params: ChunkParams,
}

impl Chunker {
    pub fn new(codec: Box<dyn TokenCodec>, params: ChunkParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { codec, params })
    }

    /// `cl100k_base` tokenization with the given parameters.
    pub fn cl100k(params: ChunkParams) -> Result<Self> {
        Self::new(Box::new(Cl100kCodec::new()?), params)
    }

    pub fn params(&self) -> ChunkParams {
        self.params
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<String>> {
        chunk_text(self.codec.as_ref(), text, self.params.chunk_size, self.params.overlap)
    }

    /// Chunks `text` and assigns ids `"{source}_{i}"` in order.
    pub fn chunk_document(&self, source: &str, text: &str) -> Result<Vec<Chunk>> {
        Ok(self
            .chunk(text)?
            .into_iter()
            .enumerate()
            .map(|(i, piece)| Chunk::new(source, i, piece))
            .collect())
    }
}

// Longest run of tokens that can encode the bytes of one character.
const MAX_PARTIAL_TOKENS: usize = 3;

/// The `cl100k_base` byte-level BPE.
pub struct Cl100kCodec {
    bpe: CoreBPE,
}

impl Cl100kCodec {
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }

    fn decode_exact(&self, tokens: &[u32]) -> Option<String> {
        self.bpe.decode(tokens.iter().map(|&t| t as _).collect()).ok()
    }
}

impl TokenCodec for Cl100kCodec {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text).into_iter().map(|t| t as u32).collect()
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        if let Some(text) = self.decode_exact(tokens) {
            return Ok(text);
        }
        // A window edge can split a multi-byte character; drop the pieces.
        for trimmed in 1..=2 * MAX_PARTIAL_TOKENS {
            for head in 0..=trimmed.min(MAX_PARTIAL_TOKENS) {
                let tail = trimmed - head;
                if tail > MAX_PARTIAL_TOKENS || head + tail >= tokens.len() {
                    continue;
                }
                if let Some(text) = self.decode_exact(&tokens[head..tokens.len() - tail]) {
                    return Ok(text);
                }
            }
        }
        // Nothing whole survives trimming; keep the bytes with replacement characters.
        let bytes: Vec<u8> =
            self.bpe._decode_native_and_split(tokens.iter().map(|&t| t as _).collect()).flatten().collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// One token per whitespace-separated word.
    #[derive(Default)]
    struct WordCodec {
        vocab: Mutex<(HashMap<String, u32>, Vec<String>)>,
    }

    impl TokenCodec for WordCodec {
        fn encode(&self, text: &str) -> Vec<u32> {
            let mut guard = self.vocab.lock().expect("vocab");
            let (ids, words) = &mut *guard;
            text.split_whitespace()
                .map(|w| {
                    *ids.entry(w.to_string()).or_insert_with(|| {
                        words.push(w.to_string());
                        (words.len() - 1) as u32
                    })
                })
                .collect()
        }

        fn decode(&self, tokens: &[u32]) -> Result<String> {
            let guard = self.vocab.lock().expect("vocab");
            Ok(tokens.iter().map(|&t| guard.1[t as usize].as_str()).collect::<Vec<_>>().join(" "))
        }
    }

    fn rejoin(windows: &[&[u32]], overlap: usize) -> Vec<u32> {
        let mut out = Vec::new();
        for (i, w) in windows.iter().enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            out.extend_from_slice(&w[skip..]);
        }
        out
    }

    #[test]
    fn windows_rejoin_to_original_tokens() {
        let params = ChunkParams::new(500, 80).expect("params");
        for len in [1usize, 2, 79, 80, 420, 499, 500, 501, 919, 920, 921, 1337, 2500] {
            let tokens: Vec<u32> = (0..len as u32).collect();
            let windows = window_tokens(&tokens, params).expect("windows");
            assert_eq!(rejoin(&windows, 80), tokens, "len={len}");
            assert!(windows.iter().all(|w| w.len() <= 500));
        }
    }

    #[test]
    fn short_input_is_single_chunk() {
        let tokens: Vec<u32> = (0..120).collect();
        let windows = window_tokens(&tokens, ChunkParams::new(500, 80).expect("params")).expect("windows");
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].len(), 120);
    }

    #[test]
    fn consecutive_windows_share_overlap() {
        let tokens: Vec<u32> = (0..30).collect();
        let windows = window_tokens(&tokens, ChunkParams::new(10, 3).expect("params")).expect("windows");
        assert_eq!(windows[0], &tokens[0..10]);
        assert_eq!(windows[1], &tokens[7..17]);
        assert_eq!(windows.last().map(|w| *w.last().expect("non-empty")), Some(29));
        for pair in windows.windows(2) {
            assert_eq!(&pair[0][pair[0].len() - 3..], &pair[1][..3]);
        }
    }

    #[test]
    fn overlap_not_smaller_than_size_is_configuration_error() {
        for size in 1..=40 {
            for overlap in [size, size + 1, size * 2] {
                let err = ChunkParams::new(size, overlap).expect_err("must be rejected");
                assert!(err.is_configuration(), "size={size} overlap={overlap}");
            }
        }
        let codec = WordCodec::default();
        assert!(matches!(chunk_text(&codec, "a b c", 4, 4), Err(Error::InvalidConfig(_))));
        assert!(matches!(chunk_text(&codec, "a b c", 0, 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn empty_text_has_no_chunks() {
        let codec = WordCodec::default();
        assert!(chunk_text(&codec, "", 5, 1).expect("chunk").is_empty());
    }

    #[test]
    fn chunk_document_numbers_chunks_by_source() {
        let chunker = Chunker::new(Box::new(WordCodec::default()), ChunkParams::new(4, 1).expect("params"))
            .expect("chunker");
        let chunks = chunker.chunk_document("doc.txt", "a b c d e f g h i j").expect("chunks");
        let ids: Vec<_> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, ["doc.txt_0", "doc.txt_1", "doc.txt_2"]);
        assert_eq!(chunks[0].text, "a b c d");
        assert_eq!(chunks[1].text, "d e f g");
        assert_eq!(chunks[2].text, "g h i j");
        assert!(chunks.iter().all(|c| c.source == "doc.txt"));
    }

    #[test]
    fn chunking_is_deterministic() {
        let chunker = Chunker::new(Box::new(WordCodec::default()), ChunkParams::new(3, 1).expect("params"))
            .expect("chunker");
        let text = "the quick brown fox jumps over the lazy dog";
        assert_eq!(chunker.chunk(text).expect("first"), chunker.chunk(text).expect("second"));
    }

    #[test]
    fn cl100k_round_trips_ascii_text() {
        let codec = Cl100kCodec::new().expect("codec");
        let text = "Token based chunking keeps boundaries aligned with the model.";
        let tokens = codec.encode(text);
        assert!(tokens.len() > 5);
        assert_eq!(codec.decode(&tokens).expect("decode"), text);
    }

    #[test]
    fn cl100k_small_windows_over_multibyte_text_still_chunk() {
        let codec = Cl100kCodec::new().expect("codec");
        for text in ["crab 🦀🦀 done", "東京都の天気は晴れです"] {
            let tokens = codec.encode(text);
            for size in 1..=3 {
                let chunks = chunk_text(&codec, text, size, 0).expect("chunk");
                assert_eq!(chunks.len(), tokens.len().div_ceil(size), "text={text:?} size={size}");
            }
        }
        let chunks = chunk_text(&codec, "crab 🦀🦀 done", 2, 0).expect("chunk");
        assert_eq!(chunks.first().map(String::as_str), Some("crab"));
        assert!(chunks.last().is_some_and(|c| c.ends_with("done")));
    }
}
