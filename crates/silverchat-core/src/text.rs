//! Text normalization and n-gram tokenization shared by indexing and querying.
//!
//! Document tokenization emits unigrams, bigrams, and trigrams; query
//! tokenization stops at bigrams and drops interrogatives. The asymmetry is
//! intentional and load-bearing for ranking parity with the content index.

use std::collections::HashSet;

/// Particles, conjunctions, and demonstratives excluded from unigrams.
const STOPWORDS: &[&str] = &[
    "은", "는", "이", "가", "을", "를", "의", "에", "에서", "으로", "로", "과", "와", "도", "만",
    "까지", "부터", "하고", "그리고", "또는", "그", "그것", "저", "저것", "이것", "저것들",
    "그것들", "등", "및",
];

/// Interrogatives additionally dropped from queries.
const QUERY_STOPWORDS: &[&str] = &["무엇", "어떻게", "언제", "어디", "왜", "누구"];

const MIN_BIGRAM_CHARS: usize = 3;
const MIN_TRIGRAM_CHARS: usize = 5;

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || matches!(c, '\u{3131}'..='\u{314E}' | '\u{314F}'..='\u{3163}' | '가'..='힣')
}

/// Lowercase, strip everything outside word/Hangul ranges, collapse whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if is_word_char(c) {
            cleaned.push(c);
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenMode {
    Document,
    Query,
}

/// Index-side tokens: unigrams + bigrams + trigrams, deduplicated in order.
#[must_use]
pub fn tokenize_document(text: &str) -> Vec<String> {
    tokenize(text, TokenMode::Document)
}

/// Query-side tokens: unigrams + bigrams only, with interrogatives removed.
#[must_use]
pub fn tokenize_query(text: &str) -> Vec<String> {
    tokenize(text, TokenMode::Query)
}

fn tokenize(text: &str, mode: TokenMode) -> Vec<String> {
    let normalized = normalize(text);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

    let mut seen = HashSet::<String>::new();
    let mut out = Vec::<String>::new();
    let mut push = |token: String| {
        if seen.insert(token.clone()) {
            out.push(token);
        }
    };

    for word in &words {
        if word.chars().count() > 1 && !is_stopword(word, mode) {
            push((*word).to_string());
        }
    }

    for pair in words.windows(2) {
        let bigram = format!("{} {}", pair[0], pair[1]);
        if bigram.chars().count() >= MIN_BIGRAM_CHARS {
            push(bigram);
        }
    }

    if mode == TokenMode::Document {
        for triple in words.windows(3) {
            let trigram = format!("{} {} {}", triple[0], triple[1], triple[2]);
            if trigram.chars().count() >= MIN_TRIGRAM_CHARS {
                push(trigram);
            }
        }
    }

    out
}

fn is_stopword(word: &str, mode: TokenMode) -> bool {
    STOPWORDS.contains(&word) || (mode == TokenMode::Query && QUERY_STOPWORDS.contains(&word))
}
