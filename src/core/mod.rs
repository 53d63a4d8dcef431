//! Core analysis: similarity scoring, similarity backends, conflict findings
//! and the conflict detectors.

pub mod backend;
pub mod conflict;
pub mod detectors;
pub mod similarity;

pub use backend::{ExactOnlyBackend, SimilarityBackend, SimilarityMatrix};
#[cfg(feature = "vector-similarity")]
pub use backend::VectorBackend;
pub use conflict::{Conflict, ConflictSet, ConflictType};
pub use detectors::detect_conflicts;
pub use similarity::{normalize_pattern, pattern_overlap};
