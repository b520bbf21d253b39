//! TF-IDF vector index for working-memory retrieval.
//!
//! Pure-Rust, in-process implementation of:
//! - Sparse TF-IDF vectorization over a small document set
//! - Cosine similarity between sparse vectors
//!
//! The index is rebuilt from the live item set on every retrieval. Working
//! memory is capped at a few dozen items, so there is nothing to cache.

use std::collections::HashMap;

/// Sparse term-weight vector.
pub type SparseVector = HashMap<String, f64>;

/// Compute cosine similarity between two sparse vectors.
///
/// Returns a value in [0, 1] for non-negative weights.
/// Returns 0.0 if either vector is empty or has zero norm.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, x)| large.get(term).map(|y| x * y))
        .sum();

    let norm_a: f64 = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|y| y * y).sum::<f64>().sqrt();

    let denom = norm_a * norm_b;
    if denom < 1e-10 {
        return 0.0;
    }

    dot / denom
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// A TF-IDF index over a fixed set of documents.
#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    idf: HashMap<String, f64>,
    vectors: Vec<SparseVector>,
}

impl TfIdfIndex {
    /// Build an index over `documents`. Document order is preserved, so
    /// `scores()[i]` belongs to `documents[i]`.
    pub fn build<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokenized: Vec<Vec<String>> = documents.into_iter().map(tokenize).collect();
        let n = tokenized.len() as f64;

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&String> = tokens.iter().collect();
            seen.sort();
            seen.dedup();
            for term in seen {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        // Smoothed IDF: terms present in every document still carry weight.
        let idf: HashMap<String, f64> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let weight = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term, weight)
            })
            .collect();

        let vectors = tokenized
            .iter()
            .map(|tokens| weigh(tokens, &idf))
            .collect();

        Self { idf, vectors }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Cosine similarity of the query against every indexed document, in
    /// document order. Query terms unseen in the corpus are ignored.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let query_vec = weigh(&tokenize(query), &self.idf);
        self.vectors
            .iter()
            .map(|doc| cosine_similarity(doc, &query_vec))
            .collect()
    }
}

fn weigh(tokens: &[String], idf: &HashMap<String, f64>) -> SparseVector {
    let mut tf: HashMap<String, f64> = HashMap::new();
    for token in tokens {
        if idf.contains_key(token) {
            *tf.entry(token.clone()).or_insert(0.0) += 1.0;
        }
    }
    let total = tokens.len().max(1) as f64;
    tf.into_iter()
        .map(|(term, count)| {
            let weight = (count / total) * idf[&term];
            (term, weight)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(pairs: &[(&str, f64)]) -> SparseVector {
        pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn cosine_identical_vectors() {
        let a = vec_of(&[("rust", 1.0), ("wasm", 2.0)]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec_of(&[("rust", 1.0)]);
        let b = vec_of(&[("python", 1.0)]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn cosine_empty_is_zero() {
        let a = vec_of(&[("rust", 1.0)]);
        assert_eq!(cosine_similarity(&a, &SparseVector::new()), 0.0);
    }

    #[test]
    fn index_ranks_matching_document_first() {
        let index = TfIdfIndex::build([
            "rust ownership and borrowing",
            "python scripting for data",
            "the weather in tokyo",
        ]);
        assert_eq!(index.len(), 3);

        let scores = index.scores("rust borrowing");
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn unknown_query_terms_score_zero() {
        let index = TfIdfIndex::build(["alpha beta", "gamma delta"]);
        assert!(index.scores("zeta").iter().all(|s| *s == 0.0));
    }

    #[test]
    fn empty_index() {
        let index = TfIdfIndex::build(std::iter::empty());
        assert!(index.is_empty());
        assert!(index.scores("anything").is_empty());
    }
}
