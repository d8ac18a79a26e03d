use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "silverchat")]
#[command(about = "Grounded retrieval core for the SilverChat assistant", version)]
pub struct Cli {
    /// Directory holding the markdown knowledge base.
    #[arg(long, default_value = "content/chatbot")]
    pub content: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank knowledge-base chunks against a query.
    Search(SearchArgs),
    /// Screen a piece of text for personal information.
    Pii(PiiArgs),
    /// Print corpus statistics.
    Stats,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(allow_hyphen_values = true)]
    pub query: String,
    /// Maximum number of results.
    #[arg(long)]
    pub top_k: Option<usize>,
    /// Minimum BM25 score a result must reach.
    #[arg(long)]
    pub min_score: Option<f32>,
    /// Use substring fallback matching instead of BM25.
    #[arg(long, default_value_t = false)]
    pub fuzzy: bool,
    /// Print the grounding context block instead of JSON hits.
    #[arg(long, default_value_t = false)]
    pub context: bool,
}

#[derive(Debug, Args)]
pub struct PiiArgs {
    pub text: String,
}
