use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `enricher` - fills in a structured record about a topic by researching it.
#[derive(Parser, Debug)]
#[command(name = "enricher")]
#[command(version)]
#[command(about = "Iterative, self-checking information extraction.", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.enricher/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print the resulting record as JSON
    Run {
        /// What to research, e.g. a company or person
        #[arg(short, long)]
        topic: String,

        /// JSON Schema file describing the record to fill in
        #[arg(short, long)]
        schema: PathBuf,

        /// Override the iteration budget
        #[arg(long)]
        max_loops: Option<u32>,

        /// Include the full conversation in the output
        #[arg(long)]
        transcript: bool,
    },

    /// Print the effective configuration with secrets redacted
    Config,
}
