//! Calls command: symbol-level call graph traversal.

use std::path::PathBuf;

use super::{Context, file_arg};
use crate::cli::output::{Envelope, Status};
use reposcope::Direction;

pub struct CallsArgs {
    pub symbol: String,
    pub file: PathBuf,
    pub direction: Direction,
    pub depth: Option<usize>,
}

pub async fn run(ctx: &Context, args: CallsArgs) -> anyhow::Result<Status> {
    let indexer = ctx.ready_indexer().await?;
    let file = file_arg(&indexer, &args.file)?;
    let analysis = indexer.analyze_symbol(&args.symbol, &file, args.direction, args.depth)?;

    let status = if analysis.visited_nodes.is_empty() {
        Status::NotFound
    } else {
        Status::Success
    };
    if ctx.json {
        let message = format!("{} symbols reached", analysis.visited_nodes.len());
        return Envelope::new("calls", status, message, analysis).print();
    }

    let label = match args.direction {
        Direction::Outgoing => "calls",
        Direction::Incoming => "is called by",
    };
    println!("{} {label}:", analysis.root);
    for node in &analysis.visited_nodes {
        println!("  {}{}", "  ".repeat(node.depth.saturating_sub(1)), node.id);
    }
    if analysis.visited_nodes.is_empty() {
        println!("  (nothing)");
    }
    if analysis.truncated {
        println!("(depth limit reached)");
    }
    Ok(status)
}
