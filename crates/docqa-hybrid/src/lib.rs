//! docqa-hybrid
//!
//! The hybrid retrieval store: one ordered chunk corpus searchable by L2
//! distance and by BM25, merged by rank union.

pub mod merge;
pub mod shared;
pub mod store;

pub use merge::rank_union;
pub use shared::SharedStore;
pub use store::{HybridStore, StoreStats, StoredChunk};
