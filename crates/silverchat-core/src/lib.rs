// Public fallible APIs in this crate share one concrete error contract
// (`ChatCoreError`). Repeating per-function `# Errors` boilerplate obscures
// behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod models;
pub mod pii;
pub mod ratelimit;
pub mod retrieval;
pub mod text;

pub use config::AppConfig;
pub use corpus::{Corpus, CorpusStore};
pub use error::{ChatCoreError, Result};
pub use models::{Chunk, SearchHit};
pub use ratelimit::{RateDecision, RateLimiter};
pub use retrieval::SearchOptions;
