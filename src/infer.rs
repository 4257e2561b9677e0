//! Structural shape inference over sampled rows.
//!
//! The entry point is [`infer_schema`]: it walks the column catalog and
//! dispatches each semi-structured column to the matching resolver.
//!
//! - `variant` columns resolve a single subtype ([`resolve_variant_subtype`]).
//!   Object wins as soon as one sampled value is a mapping, then array, then
//!   the first non-null primitive kind seen.
//! - `array` columns report the distinct element kinds observed across every
//!   sampled array ([`infer_array_shape`]), one level deep.
//! - `object` columns union the keys of every sampled mapping and re-enter
//!   the dispatch for each key as a `variant` column over those mappings
//!   ([`infer_object_shape`]).
//! - everything else passes through as [`SchemaNode::Scalar`] and is never
//!   inspected.
//!
//! Inference never aborts a build. A column whose inference fails (today only
//! by exceeding [`InferenceOptions::max_depth`]) is reported with an absent
//! schema and the remaining columns proceed.

use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
};

use itertools::Itertools;
use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

use crate::{
    schema::{ColumnEntry, DeclaredType, InferredColumn, InferredSchema, Row, SchemaNode},
    value::{Subtype, ValueKind, classify},
};

pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Deepest nesting level the dispatch may re-enter.
    pub max_depth: usize,
    /// Deeply infer the children of variant columns that resolve to object or
    /// array instead of reporting empty placeholders.
    pub expand_variant_objects: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            expand_variant_objects: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    #[error("'{column}' nests deeper than the limit of {limit} level(s)")]
    DepthExceeded { column: String, limit: usize },
}

pub fn infer_schema<R: Borrow<Row>>(columns: &[ColumnEntry], rows: &[R]) -> InferredSchema {
    infer_schema_with_options(columns, rows, &InferenceOptions::default())
}

pub fn infer_schema_with_options<R: Borrow<Row>>(
    columns: &[ColumnEntry],
    rows: &[R],
    options: &InferenceOptions,
) -> InferredSchema {
    let inferrer = ShapeInferrer { options };
    let columns = columns
        .iter()
        .map(|entry| {
            let schema = match inferrer.dispatch(&entry.name, entry.declared_type, rows, 0) {
                Ok(node) => {
                    debug!(
                        "Column '{}' ({}) resolved to {}",
                        entry.name,
                        entry.declared_type,
                        node.label()
                    );
                    Some(node)
                }
                Err(err) => {
                    warn!(
                        "Column '{}' left unresolved after inference failed: {err}",
                        entry.name
                    );
                    None
                }
            };
            InferredColumn {
                name: entry.name.clone(),
                declared_type: entry.declared_type,
                schema,
            }
        })
        .collect();
    InferredSchema { columns }
}

/// Resolves a variant column to a [`SchemaNode::Variant`] with placeholder
/// children.
pub fn resolve_variant<R: Borrow<Row>>(column: &str, rows: &[R]) -> SchemaNode {
    let subtype = resolve_variant_subtype(column, rows);
    SchemaNode::Variant {
        subtype,
        child: placeholder_child(subtype).map(Box::new),
    }
}

/// Picks the subtype of a variant column from the sampled rows.
///
/// Rows that lack the column are skipped. Scanning stops at the first mapping
/// value since object outranks every other kind.
pub fn resolve_variant_subtype<R: Borrow<Row>>(column: &str, rows: &[R]) -> Option<Subtype> {
    let mut observed: Vec<ValueKind> = Vec::new();
    for row in rows {
        let Some(value) = cell(row, column) else {
            continue;
        };
        let kind = classify(value);
        if kind == ValueKind::Object {
            return Some(Subtype::Object);
        }
        if !observed.contains(&kind) {
            observed.push(kind);
        }
    }
    if observed.contains(&ValueKind::Array) {
        return Some(Subtype::Array);
    }
    observed.into_iter().find_map(ValueKind::subtype)
}

/// Distinct element kinds across every array value of the column, in order of
/// first appearance. Non-array values contribute nothing.
pub fn array_element_kinds<R: Borrow<Row>>(column: &str, rows: &[R]) -> Vec<ValueKind> {
    rows.iter()
        .filter_map(|row| cell(row, column))
        .filter_map(Value::as_array)
        .flatten()
        .map(classify)
        .unique()
        .collect()
}

pub fn infer_array_shape<R: Borrow<Row>>(column: &str, rows: &[R]) -> SchemaNode {
    SchemaNode::Array {
        items: array_element_kinds(column, rows)
            .into_iter()
            .map(element_placeholder)
            .collect(),
    }
}

/// Infers the key shape of an object column with default options.
pub fn infer_object_shape<R: Borrow<Row>>(column: &str, rows: &[R]) -> SchemaNode {
    let options = InferenceOptions::default();
    ShapeInferrer { options: &options }
        .object_shape(column, rows, 0)
        .unwrap_or_else(|_| SchemaNode::empty_object())
}

fn cell<'r, R: Borrow<Row>>(row: &'r R, column: &str) -> Option<&'r Value> {
    <R as Borrow<Row>>::borrow(row).get(column)
}

fn element_placeholder(kind: ValueKind) -> SchemaNode {
    let subtype = kind.subtype();
    SchemaNode::Variant {
        subtype,
        child: placeholder_child(subtype).map(Box::new),
    }
}

fn placeholder_child(subtype: Option<Subtype>) -> Option<SchemaNode> {
    match subtype {
        Some(Subtype::Object) => Some(SchemaNode::empty_object()),
        Some(Subtype::Array) => Some(SchemaNode::empty_array()),
        _ => None,
    }
}

struct ShapeInferrer<'a> {
    options: &'a InferenceOptions,
}

impl ShapeInferrer<'_> {
    fn dispatch<R: Borrow<Row>>(
        &self,
        column: &str,
        declared: DeclaredType,
        rows: &[R],
        depth: usize,
    ) -> Result<SchemaNode, InferError> {
        if depth > self.options.max_depth {
            return Err(InferError::DepthExceeded {
                column: column.to_string(),
                limit: self.options.max_depth,
            });
        }
        match declared {
            DeclaredType::Other => Ok(SchemaNode::Scalar),
            DeclaredType::Variant => self.variant(column, rows, depth),
            DeclaredType::Array => Ok(infer_array_shape(column, rows)),
            DeclaredType::Object => self.object_shape(column, rows, depth),
        }
    }

    fn variant<R: Borrow<Row>>(
        &self,
        column: &str,
        rows: &[R],
        depth: usize,
    ) -> Result<SchemaNode, InferError> {
        let subtype = resolve_variant_subtype(column, rows);
        let child = match subtype {
            Some(Subtype::Object) if self.options.expand_variant_objects => {
                Some(self.object_shape(column, rows, depth)?)
            }
            Some(Subtype::Array) if self.options.expand_variant_objects => {
                Some(infer_array_shape(column, rows))
            }
            other => placeholder_child(other),
        };
        Ok(SchemaNode::Variant {
            subtype,
            child: child.map(Box::new),
        })
    }

    fn object_shape<R: Borrow<Row>>(
        &self,
        column: &str,
        rows: &[R],
        depth: usize,
    ) -> Result<SchemaNode, InferError> {
        let documents: Vec<&Row> = rows
            .iter()
            .filter_map(|row| cell(row, column))
            .filter_map(Value::as_object)
            .collect();
        let keys: BTreeSet<&str> = documents
            .iter()
            .flat_map(|document| document.keys().map(String::as_str))
            .collect();

        let mut properties = BTreeMap::new();
        for key in keys {
            let node = self.dispatch(key, DeclaredType::Variant, &documents, depth + 1)?;
            properties.insert(key.to_string(), node);
        }
        Ok(SchemaNode::Object { properties })
    }
}
