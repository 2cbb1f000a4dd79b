//! Command line surface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "genkit",
    version,
    about = "Idempotent transport and schema scaffolding for go-kit services",
    long_about = None
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Configuration file (default: genkit.toml in the working directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    /// Report what would change without writing anything
    #[arg(long, global = true)]
    pub(crate) dry_run: bool,

    /// Print the generation report as JSON
    #[arg(long, global = true)]
    pub(crate) json: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Generate artifacts for a service
    Add {
        #[command(subcommand)]
        target: AddTarget,
    },

    /// Print the parsed symbol model of a Go or proto file
    Inspect {
        /// File to parse; `.proto` files are read as schema documents
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum AddTarget {
    /// Schema, pb records, handlers, handler base and routes
    Transport(TransportArgs),

    /// Schema document and pb records only
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub(crate) struct TransportArgs {
    /// Service name (snake case, e.g. user_order)
    pub(crate) service: String,

    /// Transport kind: http or grpc
    #[arg(short, long, default_value = "http")]
    pub(crate) transport: String,

    /// Mount HTTP handlers on gorilla/mux with CORS
    #[arg(short, long)]
    pub(crate) gorilla: bool,

    /// Only generate for these methods
    #[arg(short, long, value_delimiter = ',')]
    pub(crate) methods: Vec<String>,

    /// Write rewritten legacy signatures back to the service declaration
    #[arg(long)]
    pub(crate) rewrite_signatures: bool,
}

#[derive(Debug, Args)]
pub(crate) struct SchemaArgs {
    /// Service name (snake case)
    pub(crate) service: String,

    /// Only generate for these methods
    #[arg(short, long, value_delimiter = ',')]
    pub(crate) methods: Vec<String>,
}
