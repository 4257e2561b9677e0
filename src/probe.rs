use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    cli::ProbeArgs,
    cluster_key::{ClusteringKeySegment, parse_clustering_key},
    infer::{InferenceOptions, infer_schema_with_options},
    io_utils,
    schema::InferredSchema,
    source::{ContainerCache, TableRef, TabularSource, WarehouseSnapshot},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub sampled_rows: usize,
    #[serde(flatten)]
    pub schema: InferredSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering_key: Option<Vec<ClusteringKeySegment>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDescription {
    pub name: String,
    pub tables: Vec<TableDescription>,
}

/// Tables listed under one container, cached per container name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Maximum rows sampled per table; `0` samples every row.
    pub sample_rows: usize,
    pub inference: InferenceOptions,
}

pub struct Prober<'a, S: TabularSource> {
    source: &'a S,
    settings: ProbeSettings,
    summaries: ContainerCache<ContainerSummary>,
}

impl<'a, S: TabularSource> Prober<'a, S> {
    pub fn new(source: &'a S, settings: ProbeSettings) -> Self {
        Self {
            source,
            settings,
            summaries: ContainerCache::new(),
        }
    }

    pub fn container_summary(&self, container: &str) -> Result<Arc<ContainerSummary>> {
        self.summaries.get_or_try_compute(container, || {
            debug!("Listing tables for container '{container}'");
            let tables = self
                .source
                .list_tables(container)
                .with_context(|| format!("Listing tables in container '{container}'"))?;
            Ok(ContainerSummary { tables })
        })
    }

    pub fn describe_table(&self, table: &TableRef) -> Result<TableDescription> {
        let columns = self
            .source
            .list_columns(table)
            .with_context(|| format!("Listing columns of {table}"))?;
        let rows = self
            .source
            .sample_rows(table, self.settings.sample_rows)
            .with_context(|| format!("Sampling rows of {table}"))?;
        let schema = infer_schema_with_options(&columns, &rows, &self.settings.inference);

        let names = self
            .source
            .column_names(table)
            .with_context(|| format!("Listing column names of {table}"))?;
        let expression = self
            .source
            .clustering_key_expression(table)
            .with_context(|| format!("Reading clustering key of {table}"))?;
        let clustering_key = parse_clustering_key(&names, expression.as_deref());

        debug!(
            "Described {table}: {} column(s) from {} sampled row(s)",
            schema.len(),
            rows.len()
        );
        Ok(TableDescription {
            name: table.table.clone(),
            sampled_rows: rows.len(),
            schema,
            clustering_key,
        })
    }

    pub fn describe_container(&self, container: &str) -> Result<ContainerDescription> {
        let summary = self.container_summary(container)?;
        let tables = summary
            .tables
            .iter()
            .map(|table| self.describe_table(&TableRef::new(container, table.as_str())))
            .collect::<Result<Vec<_>>>()?;
        Ok(ContainerDescription {
            name: container.to_string(),
            tables,
        })
    }

    /// Describes every container, or only the selected tables when
    /// `selection` is non-empty. Selected tables keep their listing order.
    pub fn describe_all(&self, selection: &[TableRef]) -> Result<Vec<ContainerDescription>> {
        let containers = self
            .source
            .list_containers()
            .context("Listing containers")?;
        if selection.is_empty() {
            return containers
                .iter()
                .map(|container| self.describe_container(container))
                .collect();
        }

        let mut described = Vec::new();
        for container in containers {
            let wanted = selection
                .iter()
                .filter(|selected| selected.container == container)
                .collect::<Vec<_>>();
            if wanted.is_empty() {
                continue;
            }
            let summary = self.container_summary(&container)?;
            for selected in &wanted {
                anyhow::ensure!(
                    summary.tables.contains(&selected.table),
                    "Table '{selected}' not found"
                );
            }
            let tables = summary
                .tables
                .iter()
                .filter(|table| wanted.iter().any(|selected| &selected.table == *table))
                .map(|table| self.describe_table(&TableRef::new(container.as_str(), table.as_str())))
                .collect::<Result<Vec<_>>>()?;
            described.push(ContainerDescription {
                name: container,
                tables,
            });
        }
        for selected in selection {
            anyhow::ensure!(
                described.iter().any(|c| c.name == selected.container),
                "Container '{}' not found",
                selected.container
            );
        }
        Ok(described)
    }
}

pub fn parse_selection(selectors: &[String]) -> Result<Vec<TableRef>> {
    selectors
        .iter()
        .map(|selector| selector.trim())
        .filter(|selector| !selector.is_empty())
        .map(|selector| selector.parse::<TableRef>())
        .collect()
}

pub fn settings_from_args(sample_rows: usize, max_depth: usize, expand: bool) -> ProbeSettings {
    ProbeSettings {
        sample_rows,
        inference: InferenceOptions {
            max_depth,
            expand_variant_objects: expand,
        },
    }
}

pub fn execute(args: &ProbeArgs) -> Result<()> {
    info!("Probing snapshot {:?}", args.input);
    let snapshot = WarehouseSnapshot::load(&args.input)?;
    let selection = parse_selection(&args.tables)?;
    let settings = settings_from_args(
        args.sample_rows,
        args.max_depth,
        args.expand_variant_objects,
    );
    let prober = Prober::new(&snapshot, settings);
    let described = prober.describe_all(&selection)?;

    io_utils::write_document(args.output.as_deref(), &described, args.format)
        .context("Writing inferred schema document")?;
    let table_count: usize = described.iter().map(|c| c.tables.len()).sum();
    info!(
        "Inferred schema for {} table(s) across {} container(s)",
        table_count,
        described.len()
    );
    Ok(())
}
