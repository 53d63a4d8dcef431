//! Similarity backends for fuzzy redundancy detection.
//!
//! The backend is chosen once, when the analyzer is built. `ExactOnlyBackend`
//! is always available and reports no fuzzy capability, so the fuzzy
//! redundancy pass is skipped. `VectorBackend` scores documents with TF-IDF
//! vectors and cosine similarity; it is compiled in with the
//! `vector-similarity` feature.

use crate::config::AnalysisConfig;

use std::fmt;
use tracing::debug;

/// Dense, symmetric pairwise similarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Create a zeroed matrix for `size` documents.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Number of documents.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Similarity between documents `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }
}

/// Capability interface for document similarity.
pub trait SimilarityBackend: Send + Sync + fmt::Debug {
    /// Backend name, used in logs and cache keys.
    fn name(&self) -> &'static str;

    /// Pairwise similarity for the given documents, or `None` when the backend
    /// has no fuzzy capability.
    fn similarity_matrix(&self, documents: &[String]) -> Option<SimilarityMatrix>;
}

/// Backend without fuzzy capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactOnlyBackend;

impl SimilarityBackend for ExactOnlyBackend {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn similarity_matrix(&self, _documents: &[String]) -> Option<SimilarityMatrix> {
        None
    }
}

/// Select the similarity backend for an analyzer.
pub fn probe(config: &AnalysisConfig) -> Box<dyn SimilarityBackend> {
    if config.fuzzy_redundancy {
        if let Some(backend) = vector_backend() {
            debug!(backend = backend.name(), "Selected similarity backend");
            return backend;
        }
        debug!("Vector similarity not compiled in, falling back to exact matching");
    }
    Box::new(ExactOnlyBackend)
}

#[cfg(feature = "vector-similarity")]
fn vector_backend() -> Option<Box<dyn SimilarityBackend>> {
    Some(Box::new(tfidf::VectorBackend::new()))
}

#[cfg(not(feature = "vector-similarity"))]
fn vector_backend() -> Option<Box<dyn SimilarityBackend>> {
    None
}

#[cfg(feature = "vector-similarity")]
pub use tfidf::VectorBackend;

#[cfg(feature = "vector-similarity")]
mod tfidf {
    use super::{SimilarityBackend, SimilarityMatrix};

    use regex::Regex;
    use std::collections::BTreeMap;
    use std::sync::OnceLock;

    /// Sparse term vector. Ordered so that dot products sum in a fixed order.
    type TermVector = BTreeMap<String, f64>;

    /// TF-IDF vectors with smoothed IDF, L2 normalized, compared by cosine.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct VectorBackend;

    impl VectorBackend {
        /// Create a vector backend.
        pub fn new() -> Self {
            Self
        }

        fn vectorize(documents: &[String]) -> Vec<TermVector> {
            let counts: Vec<BTreeMap<String, f64>> =
                documents.iter().map(|d| term_counts(d)).collect();

            let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
            for doc in &counts {
                for term in doc.keys() {
                    *document_frequency.entry(term.as_str()).or_insert(0) += 1;
                }
            }

            let n = documents.len() as f64;
            counts
                .iter()
                .map(|doc| {
                    let mut vector: TermVector = doc
                        .iter()
                        .map(|(term, tf)| {
                            let df = document_frequency.get(term.as_str()).copied().unwrap_or(0);
                            let idf = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                            (term.clone(), tf * idf)
                        })
                        .collect();

                    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
                    if norm > 0.0 {
                        for weight in vector.values_mut() {
                            *weight /= norm;
                        }
                    }
                    vector
                })
                .collect()
        }
    }

    impl SimilarityBackend for VectorBackend {
        fn name(&self) -> &'static str {
            "tfidf"
        }

        fn similarity_matrix(&self, documents: &[String]) -> Option<SimilarityMatrix> {
            let vectors = Self::vectorize(documents);
            let mut matrix = SimilarityMatrix::new(vectors.len());
            for i in 0..vectors.len() {
                for j in i..vectors.len() {
                    matrix.set(i, j, cosine(&vectors[i], &vectors[j]));
                }
            }
            Some(matrix)
        }
    }

    fn tokens() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token regex is valid"))
    }

    fn term_counts(document: &str) -> BTreeMap<String, f64> {
        let lowered = document.to_lowercase();
        let mut counts = BTreeMap::new();
        for token in tokens().find_iter(&lowered) {
            *counts.entry(token.as_str().to_string()).or_insert(0.0) += 1.0;
        }
        counts
    }

    /// Cosine of two L2-normalized vectors. Zero vectors score 0.
    fn cosine(a: &TermVector, b: &TermVector) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let dot: f64 = a
            .iter()
            .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
            .sum();
        dot.clamp(0.0, 1.0)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_backend_has_no_matrix() {
        let docs = vec!["a".to_string(), "a".to_string()];
        assert!(ExactOnlyBackend.similarity_matrix(&docs).is_none());
    }

    #[test]
    fn test_probe_respects_config() {
        let mut config = AnalysisConfig::default();
        config.fuzzy_redundancy = false;
        assert_eq!(probe(&config).name(), "exact");
    }

    #[cfg(feature = "vector-similarity")]
    #[test]
    fn test_probe_selects_vector_backend() {
        assert_eq!(probe(&AnalysisConfig::default()).name(), "tfidf");
    }
}
