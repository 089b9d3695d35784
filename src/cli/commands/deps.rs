//! Deps command: direct or transitive import neighbours of a file.

use std::path::PathBuf;

use super::{Context, file_arg};
use crate::cli::output::{Envelope, Status};
use reposcope::{Direction, TransitiveResult};

pub struct DepsArgs {
    pub file: PathBuf,
    pub direction: Direction,
    pub transitive: bool,
    pub depth: Option<usize>,
}

pub async fn run(ctx: &Context, args: DepsArgs) -> anyhow::Result<Status> {
    let indexer = ctx.ready_indexer().await?;
    let file = file_arg(&indexer, &args.file)?;

    let result = if args.transitive || args.depth.is_some() {
        indexer.transitive_dependencies(&file, args.direction, args.depth)
    } else {
        TransitiveResult {
            files: indexer.dependencies(&file, args.direction),
            truncated: false,
        }
    };

    let status = if result.files.is_empty() {
        Status::NotFound
    } else {
        Status::Success
    };
    if ctx.json {
        let message = format!("{} files", result.files.len());
        return Envelope::new("deps", status, message, result).print();
    }

    let label = match args.direction {
        Direction::Outgoing => "imports",
        Direction::Incoming => "imported by",
    };
    println!("{file} {label} {} files:", result.files.len());
    for dep in &result.files {
        println!("  {dep}");
    }
    if result.truncated {
        println!("(depth limit reached)");
    }

    let unresolved: Vec<_> = indexer
        .unresolved_imports()
        .into_iter()
        .filter(|u| u.file == file)
        .collect();
    if args.direction == Direction::Outgoing && !unresolved.is_empty() {
        println!("unresolved:");
        for import in unresolved {
            println!("  {}:{} '{}'", import.file, import.line, import.specifier);
        }
    }
    Ok(status)
}
