//! Watch command: index once, then follow file changes until Ctrl-C.

use std::sync::Arc;

use super::Context;
use crate::cli::output::Status;
use reposcope::FileWatcher;

pub async fn run(ctx: &Context) -> anyhow::Result<Status> {
    let indexer = Arc::new(ctx.ready_indexer().await?);
    let status = indexer.index_status();
    eprintln!(
        "Watching {} ({} files, {} symbols). Press Ctrl-C to stop.",
        indexer.root().display(),
        status.total_files,
        status.symbol_count
    );

    let watcher = FileWatcher::new(indexer.clone())?;
    watcher
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[watcher] cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(Status::Success)
}
