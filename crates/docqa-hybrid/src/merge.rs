//! Rank-union merge of dense and lexical result lists.

use std::collections::HashSet;

use docqa_core::types::SearchHit;

/// Concatenates `dense` then `lexical`, keeps the first hit per chunk id,
/// and truncates to `k`.
///
/// Dense hits win over lexical ones for the same chunk; no scores are
/// compared across the two lists.
pub fn rank_union(dense: Vec<SearchHit>, lexical: Vec<SearchHit>, k: usize) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(k.min(dense.len() + lexical.len()));
    for hit in dense.into_iter().chain(lexical) {
        if merged.len() == k {
            break;
        }
        if seen.insert(hit.chunk.chunk_id.clone()) {
            merged.push(hit);
        }
    }
    merged
}
