mod engine;
mod scoring;

pub use engine::{SearchOptions, build_context, fuzzy_search, search, summarize_results};
pub use scoring::{bm25_score, idf};
