use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use silverchat_core::retrieval::{build_context, fuzzy_search, search, summarize_results};
use silverchat_core::{CorpusStore, SearchOptions, pii};

use crate::cli::{Commands, PiiArgs, SearchArgs};

pub(crate) fn run(content: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Search(args) => run_search(content, &args),
        Commands::Pii(args) => run_pii(&args),
        Commands::Stats => run_stats(content),
    }
}

fn run_search(content: &Path, args: &SearchArgs) -> Result<()> {
    let store = CorpusStore::new(content);
    let corpus = store
        .get_or_load()
        .with_context(|| format!("failed to load corpus from {}", content.display()))?;

    let defaults = SearchOptions::default();
    let options = SearchOptions {
        top_k: args.top_k.unwrap_or(defaults.top_k),
        min_score: args.min_score.unwrap_or(defaults.min_score),
    };

    let hits = if args.fuzzy {
        fuzzy_search(&args.query, &corpus, options.top_k)
    } else {
        search(&args.query, &corpus, options)
    };

    if args.context {
        println!("{}", build_context(&hits));
    } else {
        print_json(&hits)?;
        eprintln!("{}", summarize_results(&hits));
    }
    Ok(())
}

fn run_pii(args: &PiiArgs) -> Result<()> {
    let report = pii::check(&args.text);
    print_json(&report)?;
    if !report.warnings.is_empty() {
        eprintln!("{}", pii::format_warnings(&report.warnings));
    }
    Ok(())
}

fn run_stats(content: &Path) -> Result<()> {
    let store = CorpusStore::new(content);
    let corpus = store
        .get_or_load()
        .with_context(|| format!("failed to load corpus from {}", content.display()))?;

    #[derive(Serialize)]
    struct Stats {
        chunks: usize,
        avg_token_len: f32,
    }
    print_json(&Stats {
        chunks: corpus.len(),
        avg_token_len: corpus.avg_token_len(),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
