use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "fts", about = "External full-text search CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one search call and print its solutions
    Search(SearchArgs),

    /// List the fts: predicates and the accepted enum values
    Vocab {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query text, passed to the endpoint verbatim
    pub query: String,

    /// Search service URL
    #[arg(long, env = "FTS_DEFAULT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Endpoint type (e.g. SOLR)
    #[arg(long, env = "FTS_DEFAULT_ENDPOINT_TYPE")]
    pub endpoint_type: Option<String>,

    /// Extra endpoint parameters, form-urlencoded (e.g. "defType=dismax&rows=5")
    #[arg(long)]
    pub params: Option<String>,

    /// How result identifiers are bound: URI or LITERAL
    #[arg(long)]
    pub target_type: Option<String>,

    /// Deadline in milliseconds
    #[arg(long, env = "FTS_DEFAULT_TIMEOUT_MS")]
    pub timeout: Option<u64>,

    /// Bind ?score to each hit's relevance score
    #[arg(long)]
    pub score: bool,

    /// Bind ?snippet to each hit's highlighted excerpt
    #[arg(long)]
    pub snippet: bool,

    /// Wrap the call in a SERVICE fts:search block
    #[arg(long)]
    pub service: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
}
