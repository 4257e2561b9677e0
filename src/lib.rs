pub mod cli;
pub mod cluster_key;
pub mod infer;
pub mod io_utils;
pub mod preview;
pub mod probe;
pub mod schema;
pub mod source;
pub mod table;
pub mod value;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::{Cli, ClusterKeyArgs, Commands};

pub use cluster_key::{ClusteringKeySegment, parse_clustering_key};
pub use infer::{InferenceOptions, infer_schema, infer_schema_with_options};
pub use schema::{ColumnEntry, DeclaredType, InferredSchema, Row, SchemaNode};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("shape_probe", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Probe(args) => probe::execute(&args),
        Commands::ClusterKey(args) => handle_cluster_key(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

fn handle_cluster_key(args: &ClusterKeyArgs) -> Result<()> {
    let columns = args
        .columns
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>();
    debug!("Known columns: {:?}", columns);
    let segments = parse_clustering_key(&columns, Some(args.expression.as_str()));
    let rendered =
        serde_json::to_string_pretty(&segments).context("Serializing clustering key segments")?;
    println!("{rendered}");
    info!(
        "Parsed {} clustering key segment(s)",
        segments.as_ref().map(Vec::len).unwrap_or(0)
    );
    Ok(())
}
