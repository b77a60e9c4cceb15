//! docqa-text
//!
//! Tantivy-backed BM25 scoring over the chunk corpus of a store.
pub mod index;
pub mod tantivy_utils;

pub use index::{LexicalIndex, LexicalMatch};
