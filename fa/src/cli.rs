//! CLI argument parsing for fa

use clap::Parser;
use std::path::PathBuf;

/// FarmAgent - evidence-grounded agronomy recommendations
#[derive(Parser, Debug)]
#[command(
    name = "fa",
    author,
    version,
    about = "Answer agronomy questions from verified sources only",
    long_about = None,
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Documents to retrieve from the index (overrides config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Seed for exemplar selection, for reproducible prompts
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,

    /// The question to answer
    #[arg(required = true, trailing_var_arg = true)]
    pub query: Vec<String>,
}

impl Cli {
    /// Query words joined back into one string
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}
