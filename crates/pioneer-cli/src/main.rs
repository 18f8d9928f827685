//! pioneer: CLI entry point.

mod commands;

use clap::{Parser, Subcommand};
use pioneer_core::PioneerConfig;

#[derive(Parser)]
#[command(
    name = "pioneer",
    about = "Cross-reference indexer and call-graph explorer for Python, C, and C++"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index for the current directory
    Index {
        /// Worker threads (0 = auto-detect)
        #[arg(short = 'j', long, default_value_t = 0)]
        jobs: usize,
    },

    /// List all indexed symbols
    List {
        /// Do not sort the output
        #[arg(long)]
        nosort: bool,
    },

    /// Search symbols; multiple patterns narrow conjunctively
    Search {
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Show the defining file next to each match
        #[arg(long)]
        path: bool,

        /// Do not sort the output
        #[arg(long)]
        nosort: bool,
    },

    /// Find call paths between symbols
    Query {
        /// Start symbol chain (comma-separated), or START
        #[arg(short, long, value_delimiter = ',')]
        start: Vec<String>,

        /// End symbol chain (comma-separated), or END
        #[arg(short, long, value_delimiter = ',')]
        end: Vec<String>,

        /// Backtrace mode: find all callers of --end
        #[arg(short, long)]
        backtrace: bool,

        /// Treat --start and --end as substring patterns
        #[arg(short, long)]
        pattern: bool,

        /// Show the defining file next to each path element
        #[arg(long)]
        path: bool,

        /// Do not sort pattern matches
        #[arg(long)]
        nosort: bool,
    },

    /// Print the type of a symbol (function or variable)
    Type {
        symbol: String,

        /// Do not sort suggestions
        #[arg(long)]
        nosort: bool,
    },

    /// Find what matching variables are assigned from
    DataSources {
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Do not sort the output
        #[arg(long)]
        nosort: bool,
    },

    /// Find variables assigned from matching sources
    DataSinks {
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Do not sort the output
        #[arg(long)]
        nosort: bool,
    },

    /// List variables matching patterns
    Vars {
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Do not sort the output
        #[arg(long)]
        nosort: bool,
    },

    /// Find member assignments and their sources
    Member {
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Do not sort the output
        #[arg(long)]
        nosort: bool,
    },

    /// Search every indexed file for a pattern
    Grep {
        pattern: String,

        /// Interpret the pattern as a regular expression
        #[arg(long)]
        regex: bool,

        /// Case-insensitive matching
        #[arg(short, long)]
        ignore_case: bool,

        /// Worker threads (0 = auto-detect)
        #[arg(short = 'j', long, default_value_t = 0)]
        jobs: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pioneer=info".parse().expect("static directive parses")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = PioneerConfig::load_or_default();

    match cli.command {
        Commands::Index { jobs } => commands::cmd_index(&config, jobs),
        Commands::List { nosort } => commands::cmd_list(&config, nosort),
        Commands::Search {
            patterns,
            path,
            nosort,
        } => commands::cmd_search(&config, &patterns, path, nosort),
        Commands::Query {
            start,
            end,
            backtrace,
            pattern,
            path,
            nosort,
        } => commands::cmd_query(&config, start, end, backtrace, pattern, path, nosort),
        Commands::Type { symbol, nosort } => commands::cmd_type(&config, &symbol, nosort),
        Commands::DataSources { patterns, nosort } => {
            commands::cmd_data_sources(&config, &patterns, nosort)
        }
        Commands::DataSinks { patterns, nosort } => {
            commands::cmd_data_sinks(&config, &patterns, nosort)
        }
        Commands::Vars { patterns, nosort } => commands::cmd_vars(&config, &patterns, nosort),
        Commands::Member { patterns, nosort } => commands::cmd_member(&config, &patterns, nosort),
        Commands::Grep {
            pattern,
            regex,
            ignore_case,
            jobs,
        } => commands::cmd_grep(&config, &pattern, regex, ignore_case, jobs),
    }
}
