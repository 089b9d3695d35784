mod cli;

use clap::Parser;
use std::process::ExitCode;

use cli::commands::{self, Context};
use cli::output::{Status, print_error};
use cli::{Cli, Commands};
use reposcope::Settings;
use reposcope::logging;

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Index { .. } => "index",
        Commands::Search { .. } => "search",
        Commands::Deps { .. } => "deps",
        Commands::Calls { .. } => "calls",
        Commands::Status { .. } => "status",
        Commands::Watch => "watch",
        Commands::Config => "config",
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration.");
        Settings::default()
    });

    logging::init_with_config(&logging::with_verbosity(&settings.logging, cli.verbose));

    let name = command_name(&cli.command);
    let json = cli.json;
    match run(cli, settings).await {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            if json {
                print_error(name, &e);
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(Status::Error.exit_code())
        }
    }
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<Status> {
    let ctx = Context::new(settings, cli.root, cli.json)?;

    match cli.command {
        Commands::Init { force } => commands::init::run_init(&ctx, force),
        Commands::Config => commands::init::run_config(&ctx),
        Commands::Index {
            threads,
            force,
            dry_run,
        } => {
            let args = commands::index::IndexArgs {
                threads,
                force,
                dry_run,
            };
            commands::index::run(ctx, args).await
        }
        Commands::Search {
            keywords,
            limit,
            file_types,
            group,
            timeout_ms,
        } => {
            let args = commands::search::SearchArgs {
                keywords,
                limit,
                file_types,
                group,
                timeout_ms,
            };
            commands::search::run(&ctx, args).await
        }
        Commands::Deps {
            file,
            direction,
            transitive,
            depth,
        } => {
            let args = commands::deps::DepsArgs {
                file,
                direction: direction.into(),
                transitive,
                depth,
            };
            commands::deps::run(&ctx, args).await
        }
        Commands::Calls {
            symbol,
            file,
            direction,
            depth,
        } => {
            let args = commands::calls::CallsArgs {
                symbol,
                file,
                direction: direction.into(),
                depth,
            };
            commands::calls::run(&ctx, args).await
        }
        Commands::Status { unresolved } => commands::status::run(&ctx, unresolved).await,
        Commands::Watch => commands::watch::run(&ctx).await,
    }
}
