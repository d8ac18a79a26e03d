use std::sync::LazyLock;

use regex::Regex;

use crate::config::{DEFAULT_SEARCH_MIN_SCORE, DEFAULT_SEARCH_TOP_K};
use crate::corpus::Corpus;
use crate::models::SearchHit;
use crate::text::tokenize_query;

use super::scoring::{bm25_score, sort_hits_desc};

const MAX_HIGHLIGHTS: usize = 2;
const FUZZY_TEXT_MATCH_BONUS: f32 = 10.0;
const FUZZY_TITLE_MATCH_BONUS: f32 = 5.0;
const FUZZY_HEADING_MATCH_BONUS: f32 = 5.0;
const FUZZY_TOKEN_MATCH_BONUS: f32 = 1.0;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence break pattern is a valid literal"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    pub min_score: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_SEARCH_TOP_K,
            min_score: DEFAULT_SEARCH_MIN_SCORE,
        }
    }
}

/// Ranks the corpus against a query. Degenerate inputs (empty query tokens,
/// empty corpus) yield an empty result, never an error.
#[must_use]
pub fn search(query: &str, corpus: &Corpus, options: SearchOptions) -> Vec<SearchHit> {
    if corpus.is_empty() {
        return Vec::new();
    }
    let query_tokens = tokenize_query(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = corpus
        .chunks()
        .iter()
        .map(|chunk| SearchHit {
            score: bm25_score(&query_tokens, chunk, corpus),
            chunk: chunk.clone(),
            highlights: Vec::new(),
        })
        .collect();

    sort_hits_desc(&mut hits);
    hits.retain(|hit| hit.score >= options.min_score);
    hits.truncate(options.top_k);

    for hit in &mut hits {
        hit.highlights = highlight_sentences(&hit.chunk.text, &query_tokens);
    }
    hits
}

/// Fallback heuristic for queries the lexical ranking cannot serve: raw
/// substring hits in text/title/heading plus per-token overlap.
#[must_use]
pub fn fuzzy_search(query: &str, corpus: &Corpus, top_k: usize) -> Vec<SearchHit> {
    if query.trim().is_empty() || corpus.is_empty() {
        return Vec::new();
    }
    let query_lower = query.to_lowercase();
    let query_tokens = tokenize_query(query);

    let mut hits: Vec<SearchHit> = corpus
        .chunks()
        .iter()
        .map(|chunk| {
            let mut score = 0.0;
            if chunk.text.to_lowercase().contains(&query_lower) {
                score += FUZZY_TEXT_MATCH_BONUS;
            }
            if chunk.title.to_lowercase().contains(&query_lower) {
                score += FUZZY_TITLE_MATCH_BONUS;
            }
            if chunk.heading.to_lowercase().contains(&query_lower) {
                score += FUZZY_HEADING_MATCH_BONUS;
            }
            let matched = query_tokens.iter().filter(|t| chunk.has_token(t)).count();
            score += FUZZY_TOKEN_MATCH_BONUS * usize_to_f32(matched);
            SearchHit {
                chunk: chunk.clone(),
                score,
                highlights: Vec::new(),
            }
        })
        .collect();

    sort_hits_desc(&mut hits);
    hits.truncate(top_k);
    hits.retain(|hit| hit.score > 0.0);
    hits
}

/// Up to two sentences whose lowercase form contains any query token.
fn highlight_sentences(text: &str, query_tokens: &[String]) -> Vec<String> {
    let mut highlights = Vec::new();
    for sentence in SENTENCE_BREAK.split(text) {
        let lowered = sentence.to_lowercase();
        if query_tokens.iter().any(|token| lowered.contains(token.as_str())) {
            highlights.push(sentence.trim().to_string());
            if highlights.len() == MAX_HIGHLIGHTS {
                break;
            }
        }
    }
    highlights
}

/// Grounding context handed to the language-model orchestrator. The core
/// never calls the model; this string is its only LLM touchpoint.
#[must_use]
pub fn build_context(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "SEARCH RESULTS:\n(없음)\n\n규칙: 검색 결과가 없으면 추측하지 말고 \"확인이 필요합니다\"로 안내하세요."
            .to_string();
    }

    let mut out = String::from("SEARCH RESULTS:\n");
    for (index, hit) in hits.iter().enumerate() {
        out.push_str(&format!(
            "\n[{}] {} - {}\n{}\n",
            index + 1,
            hit.chunk.title,
            hit.chunk.heading,
            hit.chunk.text
        ));
    }
    out
}

/// One-line-per-hit summary for logs and operator tooling.
#[must_use]
pub fn summarize_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(index, hit)| {
            format!(
                "{}. {} - {} (score: {:.2})",
                index + 1,
                hit.chunk.title,
                hit.chunk.heading,
                hit.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[allow(
    clippy::cast_precision_loss,
    reason = "ranking weights are intentionally lossy floating-point values"
)]
const fn usize_to_f32(value: usize) -> f32 {
    value as f32
}
