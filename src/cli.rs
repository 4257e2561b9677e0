use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{infer::DEFAULT_MAX_DEPTH, io_utils::DocumentFormat};

#[derive(Debug, Parser)]
#[command(author, version, about = "Infer structural schemas for semi-structured warehouse columns", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer column shapes for every table in a warehouse snapshot
    Probe(ProbeArgs),
    /// Parse a clustering key expression into column references
    ClusterKey(ClusterKeyArgs),
    /// Print the inferred shapes of a snapshot as a flattened table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Snapshot file (JSON or YAML) with containers, column catalogs and sampled rows; '-' reads stdin
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination for the inferred schema document (defaults to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Number of rows to sample per table (0 means every row)
    #[arg(long, default_value_t = 1000)]
    pub sample_rows: usize,
    /// Restrict probing to CONTAINER.TABLE selectors (repeatable or comma-separated)
    #[arg(short = 't', long = "table", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub tables: Vec<String>,
    /// Maximum nesting depth explored before a column is left unresolved
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
    /// Deeply infer variant columns that hold objects or arrays
    #[arg(long)]
    pub expand_variant_objects: bool,
    /// Output format (inferred from the output extension when omitted)
    #[arg(long, value_enum)]
    pub format: Option<DocumentFormat>,
}

#[derive(Debug, Args)]
pub struct ClusterKeyArgs {
    /// Clustering key expression, e.g. 'LINEAR(ID, SUBSTRING(REGION, 1, 3))'
    #[arg(short = 'e', long = "expression")]
    pub expression: String,
    /// Known column names of the table
    #[arg(short = 'C', long = "columns", value_delimiter = ',', required = true)]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Snapshot file (JSON or YAML); '-' reads stdin
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Restrict the preview to CONTAINER.TABLE selectors
    #[arg(short = 't', long = "table", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub tables: Vec<String>,
    /// Number of rows to sample per table (0 means every row)
    #[arg(long, default_value_t = 1000)]
    pub sample_rows: usize,
    /// Deeply infer variant columns that hold objects or arrays
    #[arg(long)]
    pub expand_variant_objects: bool,
}
