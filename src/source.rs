//! Tabular query collaborators feeding the inference core.
//!
//! [`TabularSource`] is the seam between the pure inference code and whatever
//! answers catalog and sampling queries. The crate ships one implementation,
//! [`WarehouseSnapshot`], which serves a JSON or YAML dump of containers,
//! tables, column catalogs and sampled rows.
//!
//! [`ContainerCache`] memoizes one value per container name so repeated table
//! lookups under the same container only list it once.

use std::{fmt, path::Path, str::FromStr, sync::Arc};

use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{
    io_utils,
    schema::{ColumnEntry, DeclaredType, Row},
};

/// Identifies a table inside a container (schema/namespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub container: String,
    pub table: String,
}

impl TableRef {
    pub fn new(container: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            table: table.into(),
        }
    }
}

impl FromStr for TableRef {
    type Err = anyhow::Error;

    /// Parses `CONTAINER.TABLE`; the split happens on the last dot.
    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let (container, table) = trimmed
            .rsplit_once('.')
            .ok_or_else(|| anyhow!("Table selector '{trimmed}' must use the form CONTAINER.TABLE"))?;
        let (container, table) = (container.trim(), table.trim());
        if container.is_empty() || table.is_empty() {
            return Err(anyhow!(
                "Table selector '{trimmed}' must name both a container and a table"
            ));
        }
        Ok(TableRef::new(container, table))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.container, self.table)
    }
}

pub trait TabularSource {
    fn list_containers(&self) -> Result<Vec<String>>;

    fn list_tables(&self, container: &str) -> Result<Vec<String>>;

    fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnEntry>>;

    /// Returns up to `limit` rows; `0` returns every row.
    fn sample_rows(&self, table: &TableRef, limit: usize) -> Result<Vec<Row>>;

    fn clustering_key_expression(&self, table: &TableRef) -> Result<Option<String>>;

    fn column_names(&self, table: &TableRef) -> Result<Vec<String>> {
        Ok(self
            .list_columns(table)?
            .into_iter()
            .map(|column| column.name)
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<CatalogColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering_key: Option<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarehouseSnapshot {
    #[serde(default)]
    pub containers: Vec<ContainerSnapshot>,
}

impl WarehouseSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        io_utils::read_document(path, None).with_context(|| format!("Loading snapshot {path:?}"))
    }

    fn container(&self, name: &str) -> Result<&ContainerSnapshot> {
        self.containers
            .iter()
            .find(|container| container.name == name)
            .ok_or_else(|| anyhow!("Container '{name}' not found in snapshot"))
    }

    fn table(&self, table: &TableRef) -> Result<&TableSnapshot> {
        self.container(&table.container)?
            .tables
            .iter()
            .find(|candidate| candidate.name == table.table)
            .ok_or_else(|| anyhow!("Table '{table}' not found in snapshot"))
    }
}

impl TabularSource for WarehouseSnapshot {
    fn list_containers(&self) -> Result<Vec<String>> {
        Ok(self
            .containers
            .iter()
            .map(|container| container.name.clone())
            .collect())
    }

    fn list_tables(&self, container: &str) -> Result<Vec<String>> {
        Ok(self
            .container(container)?
            .tables
            .iter()
            .map(|table| table.name.clone())
            .collect())
    }

    fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnEntry>> {
        Ok(self
            .table(table)?
            .columns
            .iter()
            .map(|column| {
                ColumnEntry::new(
                    column.name.clone(),
                    DeclaredType::from_data_type(&column.data_type),
                )
            })
            .collect())
    }

    fn sample_rows(&self, table: &TableRef, limit: usize) -> Result<Vec<Row>> {
        let rows = &self.table(table)?.rows;
        let take = if limit == 0 { rows.len() } else { limit };
        Ok(rows.iter().take(take).cloned().collect())
    }

    fn clustering_key_expression(&self, table: &TableRef) -> Result<Option<String>> {
        Ok(self.table(table)?.clustering_key.clone())
    }
}

/// Per-container memo with at-most-one successful computation per key.
///
/// Callers racing on the same container block on that container's cell; other
/// containers are unaffected. A failed computation leaves the cell empty.
pub struct ContainerCache<T> {
    slots: DashMap<String, Arc<OnceCell<Arc<T>>>>,
}

impl<T> Default for ContainerCache<T> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }
}

impl<T> ContainerCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_try_compute<F>(&self, container: &str, compute: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        // Clone the cell out so the shard lock is released before computing.
        let slot = Arc::clone(self.slots.entry(container.to_string()).or_default().value());
        slot.get_or_try_init(|| compute().map(Arc::new)).map(Arc::clone)
    }
}
