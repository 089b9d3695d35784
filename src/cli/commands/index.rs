//! Index command: cold start against the saved snapshot.

use std::sync::Arc;

use super::Context;
use crate::cli::output::{Envelope, Status};
use reposcope::FileWalker;

pub struct IndexArgs {
    pub threads: Option<usize>,
    pub force: bool,
    pub dry_run: bool,
}

pub async fn run(ctx: Context, args: IndexArgs) -> anyhow::Result<Status> {
    let mut settings = ctx.settings.as_ref().clone();
    if let Some(threads) = args.threads {
        settings.indexing.concurrency = threads.max(1);
    }
    let ctx = Context {
        settings: Arc::new(settings),
        ..ctx
    };

    if args.dry_run {
        let files = FileWalker::new(ctx.settings.clone()).walk(&ctx.root);
        if ctx.json {
            let listed: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
            let message = format!("{} files would be indexed", listed.len());
            return Envelope::new("index", Status::Success, message, listed).print();
        }
        for file in &files {
            println!("{}", file.display());
        }
        eprintln!("{} files would be indexed", files.len());
        return Ok(Status::Success);
    }

    let indexer = ctx.indexer()?;
    if args.force {
        indexer.clear_snapshot().await?;
    }
    let stats = indexer.cold_start().await?;
    let status = indexer.index_status();

    if ctx.json {
        let message = format!("indexed {} files", stats.discovered);
        return Envelope::new("index", Status::Success, message, (stats, status)).print();
    }

    println!(
        "Indexed {} files in {}ms: {} restored, {} parsed, {} failed",
        stats.discovered, stats.elapsed_ms, stats.restored, stats.parsed, stats.failed
    );
    println!(
        "{} symbols, {} unresolved imports",
        status.symbol_count, status.unresolved_imports
    );
    if !status.parse_errors.is_empty() {
        println!("{} files failed to parse (see `reposcope status`)", status.parse_errors.len());
    }
    Ok(Status::Success)
}
