//! Exact dense retrieval over in-memory vectors and the binary artifact
//! they persist to.

pub mod artifact;
pub mod flat;

pub use artifact::{remove_if_exists, write_atomic, DenseArtifact};
pub use flat::{nearest, squared_l2, Neighbor};
