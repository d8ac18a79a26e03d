//! BM25-style lexical scoring over precomputed chunk token sets.
//!
//! Statistics are recomputed from the corpus on every call; there is no
//! persisted inverted index. That keeps ranking O(query x corpus), which is
//! acceptable only for a small fully in-memory corpus.

use std::cmp::Ordering;

use crate::corpus::Corpus;
use crate::models::{Chunk, SearchHit};

pub(super) const BM25_K1: f32 = 1.5;
pub(super) const BM25_B: f32 = 0.75;

/// Smoothed inverse document frequency. Terms the corpus has never seen
/// contribute zero rather than a negative weight.
#[must_use]
pub fn idf(term: &str, corpus: &Corpus) -> f32 {
    let df = corpus.document_frequency(term);
    if df == 0 {
        return 0.0;
    }
    let df = usize_to_f32(df);
    let n = usize_to_f32(corpus.len());
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// BM25 score of one chunk against a tokenized query. Chunk token sets are
/// deduplicated, so term frequency saturates at one; document length is the
/// token-set size.
#[must_use]
pub fn bm25_score(query_tokens: &[String], chunk: &Chunk, corpus: &Corpus) -> f32 {
    let doc_len = usize_to_f32(chunk.tokens.len());
    let avg_len = corpus.avg_token_len().max(1.0);

    let mut score = 0.0;
    for term in query_tokens {
        if !chunk.has_token(term) {
            // tf = 0 contributes nothing.
            continue;
        }
        let tf = 1.0;
        let numerator = tf * (BM25_K1 + 1.0);
        let denominator = tf + BM25_K1 * (1.0 - BM25_B + BM25_B * (doc_len / avg_len));
        score += idf(term, corpus) * (numerator / denominator);
    }
    score
}

/// Stable descending sort: equal scores keep original corpus order.
pub(super) fn sort_hits_desc(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

#[allow(
    clippy::cast_precision_loss,
    reason = "ranking weights are intentionally lossy floating-point values"
)]
const fn usize_to_f32(value: usize) -> f32 {
    value as f32
}
