use std::path::PathBuf;

const ENV_CONTENT_DIR: &str = "SILVERCHAT_CONTENT_DIR";
const ENV_RATE_LIMIT_PER_MIN: &str = "SILVERCHAT_RATE_LIMIT_PER_MIN";
const ENV_RATE_LIMIT_PER_DAY: &str = "SILVERCHAT_RATE_LIMIT_PER_DAY";
const ENV_SEARCH_TOP_K: &str = "SILVERCHAT_SEARCH_TOP_K";
const ENV_SEARCH_MIN_SCORE: &str = "SILVERCHAT_SEARCH_MIN_SCORE";

const DEFAULT_CONTENT_DIR: &str = "content";
const DEFAULT_RATE_LIMIT_PER_MIN: u32 = 10;
const DEFAULT_RATE_LIMIT_PER_DAY: u32 = 100;
pub(crate) const DEFAULT_SEARCH_TOP_K: usize = 4;
pub(crate) const DEFAULT_SEARCH_MIN_SCORE: f32 = 0.3;

#[must_use]
fn read_non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
fn read_env_u32(name: &str, default_value: u32, min_value: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

#[must_use]
fn read_env_usize(name: &str, default_value: usize, min_value: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

#[must_use]
fn read_env_f32(name: &str, default_value: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(default_value)
}

/// Retrieval defaults applied when a caller does not override them per query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    pub top_k: usize,
    pub min_score: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_SEARCH_TOP_K,
            min_score: DEFAULT_SEARCH_MIN_SCORE,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            top_k: read_env_usize(ENV_SEARCH_TOP_K, defaults.top_k, 1),
            min_score: read_env_f32(ENV_SEARCH_MIN_SCORE, defaults.min_score),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_minute: u32,
    pub per_day: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: DEFAULT_RATE_LIMIT_PER_MIN,
            per_day: DEFAULT_RATE_LIMIT_PER_DAY,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            per_minute: read_env_u32(ENV_RATE_LIMIT_PER_MIN, defaults.per_minute, 1),
            per_day: read_env_u32(ENV_RATE_LIMIT_PER_DAY, defaults.per_day, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub content_dir: PathBuf,
    pub search: SearchConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            search: SearchConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            content_dir: read_non_empty_env(ENV_CONTENT_DIR)
                .map_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR), PathBuf::from),
            search: SearchConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}
