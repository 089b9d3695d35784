//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand, ValueEnum,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use reposcope::Direction;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Live structural index of a TypeScript/JavaScript repository
#[derive(Parser)]
#[command(
    name = "reposcope",
    version = env!("CARGO_PKG_VERSION"),
    about = "Structural index with dependency/call graphs and hybrid search",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  reposcope index\n  reposcope search parseConfig --limit 10\n  reposcope deps src/app.ts --transitive --depth 3\n  reposcope calls handleRequest --file src/server.ts --direction incoming\n  reposcope watch"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository root (defaults to the workspace containing the current directory)
    #[arg(short, long, global = true, env = "REPOSCOPE_ROOT")]
    pub root: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .reposcope/settings.toml with defaults
    Init {
        /// Overwrite an existing settings file
        #[arg(short, long)]
        force: bool,
    },

    /// Build or refresh the index
    Index {
        /// Worker count for reading and parsing (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Ignore the saved snapshot and parse everything
        #[arg(short, long)]
        force: bool,

        /// List the files that would be indexed and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Ranked keyword search
    Search {
        /// Keywords (all are scored; any may match)
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only files with these extensions
        #[arg(short = 't', long = "type", value_name = "EXT")]
        file_types: Vec<String>,

        /// One result per file with its matches grouped
        #[arg(short, long)]
        group: bool,

        /// Stop reading documents after this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Import dependencies of a file
    Deps {
        /// File, relative to the root
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = DirectionArg::Outgoing)]
        direction: DirectionArg,

        /// Follow edges transitively
        #[arg(long)]
        transitive: bool,

        /// Depth limit for transitive queries
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Callers or callees of a symbol
    Calls {
        /// Symbol name
        symbol: String,

        /// File declaring the symbol, relative to the root
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = DirectionArg::Outgoing)]
        direction: DirectionArg,

        #[arg(long)]
        depth: Option<usize>,
    },

    /// Index health: stale files, parse errors, unresolved imports
    Status {
        /// List every unresolved import
        #[arg(long)]
        unresolved: bool,
    },

    /// Keep the index current while files change
    Watch,

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// What the target depends on
    #[value(alias = "downstream")]
    Outgoing,
    /// What depends on the target
    #[value(alias = "upstream")]
    Incoming,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Outgoing => Direction::Outgoing,
            DirectionArg::Incoming => Direction::Incoming,
        }
    }
}
