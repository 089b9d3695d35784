//! Search command.

use std::time::Duration;

use super::Context;
use crate::cli::output::{Envelope, Status};
use reposcope::SearchOptions;

pub struct SearchArgs {
    pub keywords: Vec<String>,
    pub limit: Option<usize>,
    pub file_types: Vec<String>,
    pub group: bool,
    pub timeout_ms: Option<u64>,
}

pub async fn run(ctx: &Context, args: SearchArgs) -> anyhow::Result<Status> {
    let indexer = ctx.ready_indexer().await?;

    let mut options = SearchOptions::default().with_file_types(args.file_types);
    if let Some(limit) = args.limit {
        options = options.with_max_results(limit);
    }
    if args.group {
        options = options.grouped();
    }
    if let Some(ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    let response = indexer.search(&args.keywords, &options).await?;

    let status = if response.results.is_empty() {
        Status::NotFound
    } else {
        Status::Success
    };
    if ctx.json {
        let message = format!(
            "{} results from {} candidates",
            response.results.len(),
            response.candidate_count
        );
        return Envelope::new("search", status, message, response).print();
    }

    if response.results.is_empty() {
        println!("No results for {}", args.keywords.join(" "));
        return Ok(status);
    }

    for result in &response.results {
        let symbol = result
            .symbol
            .as_deref()
            .map(|name| format!(" [{name}]"))
            .unwrap_or_default();
        println!(
            "{}:{}  {:.3}{symbol}\n    {}",
            result.file, result.line, result.score, result.preview
        );
        for grouped in result.grouped_matches.iter().skip(1) {
            println!("    {:>5}: {}", grouped.line, grouped.preview);
        }
    }
    if response.truncated {
        println!("(more results available; raise --limit)");
    }
    if response.degraded {
        println!("(partial: read budget or timeout reached)");
    }
    Ok(status)
}
