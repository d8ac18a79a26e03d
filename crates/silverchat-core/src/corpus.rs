//! Process-lifetime corpus: built once from the content directory, shared
//! read-only, rebuilt only through an explicit invalidation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;

use crate::document::load_chunks;
use crate::error::{ChatCoreError, Result};
use crate::models::Chunk;

/// Frozen, ordered set of all chunks across all documents. The average
/// token-set length is cached for BM25 length normalization.
#[derive(Debug, Clone, Serialize)]
pub struct Corpus {
    chunks: Vec<Chunk>,
    avg_token_len: f32,
}

impl Corpus {
    #[must_use]
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        let avg_token_len = if chunks.is_empty() {
            0.0
        } else {
            let total: usize = chunks.iter().map(|chunk| chunk.tokens.len()).sum();
            usize_to_f32(total) / usize_to_f32(chunks.len())
        };
        Self {
            chunks,
            avg_token_len,
        }
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn avg_token_len(&self) -> f32 {
        self.avg_token_len
    }

    /// Number of chunks whose token set contains `term`.
    #[must_use]
    pub fn document_frequency(&self, term: &str) -> usize {
        self.chunks
            .iter()
            .filter(|chunk| chunk.has_token(term))
            .count()
    }
}

/// Injectable corpus cache. The first successful build is memoized for the
/// process lifetime; `invalidate` clears it so content edits are picked up
/// without a restart. Concurrent first requests trigger a single build.
#[derive(Debug)]
pub struct CorpusStore {
    content_dir: PathBuf,
    cached: Mutex<Option<Arc<Corpus>>>,
}

impl CorpusStore {
    #[must_use]
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            cached: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn get_or_load(&self) -> Result<Arc<Corpus>> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| ChatCoreError::Internal("corpus cache mutex poisoned".to_string()))?;
        if let Some(corpus) = cached.as_ref() {
            return Ok(Arc::clone(corpus));
        }

        let corpus = Arc::new(Corpus::from_chunks(load_chunks(&self.content_dir)?));
        info!(
            chunks = corpus.len(),
            dir = %self.content_dir.display(),
            "corpus loaded"
        );
        *cached = Some(Arc::clone(&corpus));
        Ok(corpus)
    }

    /// Drops the memoized corpus; the next `get_or_load` rebuilds from disk.
    pub fn invalidate(&self) {
        if let Ok(mut cached) = self.cached.lock() {
            *cached = None;
        }
    }

    pub fn reload(&self) -> Result<Arc<Corpus>> {
        self.invalidate();
        self.get_or_load()
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "corpus statistics are intentionally lossy floating-point values"
)]
const fn usize_to_f32(value: usize) -> f32 {
    value as f32
}

#[cfg(test)]
mod tests {
    use super::{Corpus, CorpusStore};
    use crate::models::Chunk;
    use std::fs;
    use std::sync::Arc;

    fn chunk(id: &str, tokens: &[&str]) -> Chunk {
        Chunk {
            id: id.to_string(),
            title: String::new(),
            route: String::new(),
            category: String::new(),
            heading: String::new(),
            text: String::new(),
            position: 0,
            tokens: tokens.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn average_token_length_is_cached_at_build_time() {
        let corpus = Corpus::from_chunks(vec![
            chunk("a", &["하나", "둘"]),
            chunk("b", &["하나", "둘", "셋", "넷"]),
        ]);
        assert!((corpus.avg_token_len() - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_corpus_has_zero_average_length() {
        let corpus = Corpus::from_chunks(Vec::new());
        assert!(corpus.is_empty());
        assert!((corpus.avg_token_len() - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn document_frequency_counts_chunks_not_occurrences() {
        let corpus = Corpus::from_chunks(vec![
            chunk("a", &["면회", "시간"]),
            chunk("b", &["면회"]),
            chunk("c", &["비용"]),
        ]);
        assert_eq!(corpus.document_frequency("면회"), 2);
        assert_eq!(corpus.document_frequency("없는말"), 0);
    }

    #[test]
    fn store_memoizes_the_first_build_and_rebuilds_after_invalidate() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("one.md"),
            "---\ntitle: 문서 하나\nroute: /one\ncategory: guide\n---\n본문 내용",
        )
        .expect("write fixture");

        let store = CorpusStore::new(dir.path());
        let first = store.get_or_load().expect("first load");
        let second = store.get_or_load().expect("cached load");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);

        fs::write(
            dir.path().join("two.md"),
            "---\ntitle: 문서 둘\nroute: /two\ncategory: guide\n---\n추가 본문",
        )
        .expect("write second fixture");

        // Still cached until an explicit invalidation.
        assert_eq!(store.get_or_load().expect("still cached").len(), 1);
        let reloaded = store.reload().expect("reload");
        assert_eq!(reloaded.len(), 2);
    }
}
