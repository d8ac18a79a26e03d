use serde::{Deserialize, Serialize};

/// Metadata header parsed from the top of a source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub route: String,
    pub category: String,
}

/// Heading-delimited slice of a document body, before chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub text: String,
}

/// The atomic retrieval unit: a bounded span of section text plus its
/// precomputed token set. Immutable once the corpus is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub title: String,
    pub route: String,
    pub category: String,
    pub heading: String,
    pub text: String,
    pub position: usize,
    /// Deduplicated tokens in first-seen order. Dedup makes BM25 term
    /// frequency effectively binary; ranking depends on that staying true.
    pub tokens: Vec<String>,
}

impl Chunk {
    #[must_use]
    pub fn has_token(&self, term: &str) -> bool {
        self.tokens.iter().any(|t| t == term)
    }
}

/// One ranked retrieval hit. Ephemeral, rebuilt per query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
    /// Up to two sentences from the chunk containing a query token.
    pub highlights: Vec<String>,
}
