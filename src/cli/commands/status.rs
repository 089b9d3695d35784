//! Status command: index health report.

use super::Context;
use crate::cli::output::{Envelope, Status};
use reposcope::utils::format_timestamp;

pub async fn run(ctx: &Context, list_unresolved: bool) -> anyhow::Result<Status> {
    let indexer = ctx.ready_indexer().await?;
    let status = indexer.index_status();

    let outcome = if status.is_healthy() {
        Status::Success
    } else {
        Status::Error
    };
    if ctx.json {
        let message = format!(
            "{}/{} files indexed",
            status.indexed_files, status.total_files
        );
        return Envelope::new("status", outcome, message, status).print();
    }

    println!("Root:               {}", indexer.root().display());
    println!("Files:              {}/{} indexed", status.indexed_files, status.total_files);
    println!("Symbols:            {}", status.symbol_count);
    println!("Unresolved imports: {}", status.unresolved_imports);
    if let Some(at) = status.last_rebuilt_at {
        println!("Graph rebuilt:      {}", format_timestamp(at));
    }

    if !status.stale_files.is_empty() {
        println!("\nStale files:");
        for file in &status.stale_files {
            println!("  {file}");
        }
    }
    if !status.parse_errors.is_empty() {
        println!("\nParse errors:");
        for error in &status.parse_errors {
            println!("  {}: {}", error.file, error.message);
        }
    }
    if list_unresolved && !status.resolution_errors.is_empty() {
        println!("\nUnresolved imports:");
        for unresolved in &status.resolution_errors {
            println!("  {unresolved}");
        }
    }
    Ok(outcome)
}
