//! Schema model for sampled warehouse tables.
//!
//! This module owns the [`SchemaNode`] tagged union (the inferred shape of one
//! column or nested value), the [`DeclaredType`] coarse catalog type that
//! selects an inference path, and the [`InferredSchema`] container returned by
//! [`crate::infer::infer_schema`].
//!
//! ## Serialized form
//!
//! Nodes serialize with an internal `type` tag:
//!
//! ```json
//! { "type": "variant", "subtype": "object", "child": { "type": "object", "properties": {} } }
//! ```
//!
//! Absent subtypes and children are omitted. Object properties are key-sorted
//! so the rendered document is stable across runs.

use std::{collections::BTreeMap, fmt};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value::Subtype;

/// A sampled row: column name to runtime value.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Variant,
    Array,
    Object,
    Other,
}

impl DeclaredType {
    /// Maps a warehouse catalog type name onto the coarse inference type.
    ///
    /// Parameterized structured forms (`OBJECT(a INT)`, `ARRAY(NUMBER)`) map
    /// by their base name. Anything unrecognised is [`DeclaredType::Other`].
    pub fn from_data_type(data_type: &str) -> Self {
        let trimmed = data_type.trim();
        let base = trimmed
            .split_once('(')
            .map(|(head, _)| head)
            .unwrap_or(trimmed)
            .trim();
        if base.eq_ignore_ascii_case("variant") {
            DeclaredType::Variant
        } else if base.eq_ignore_ascii_case("array") {
            DeclaredType::Array
        } else if base.eq_ignore_ascii_case("object") {
            DeclaredType::Object
        } else {
            DeclaredType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclaredType::Variant => "variant",
            DeclaredType::Array => "array",
            DeclaredType::Object => "object",
            DeclaredType::Other => "other",
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    pub declared_type: DeclaredType,
}

impl ColumnEntry {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaNode {
    Scalar,
    Variant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtype: Option<Subtype>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        child: Option<Box<SchemaNode>>,
    },
    Array {
        #[serde(default)]
        items: Vec<SchemaNode>,
    },
    Object {
        #[serde(default)]
        properties: BTreeMap<String, SchemaNode>,
    },
}

impl SchemaNode {
    pub fn empty_object() -> Self {
        SchemaNode::Object {
            properties: BTreeMap::new(),
        }
    }

    pub fn empty_array() -> Self {
        SchemaNode::Array { items: Vec::new() }
    }

    /// A variant node with no child shape.
    pub fn bare_variant(subtype: Option<Subtype>) -> Self {
        SchemaNode::Variant {
            subtype,
            child: None,
        }
    }

    pub fn subtype(&self) -> Option<Subtype> {
        match self {
            SchemaNode::Variant { subtype, .. } => *subtype,
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        match self {
            SchemaNode::Object { properties } => Some(properties),
            SchemaNode::Variant {
                child: Some(child), ..
            } => child.properties(),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[SchemaNode]> {
        match self {
            SchemaNode::Array { items } => Some(items),
            SchemaNode::Variant {
                child: Some(child), ..
            } => child.items(),
            _ => None,
        }
    }

    /// Short human-readable label such as `variant<object>` or
    /// `array<number|string>`.
    pub fn label(&self) -> String {
        match self {
            SchemaNode::Scalar => "scalar".to_string(),
            SchemaNode::Variant { subtype, .. } => format!(
                "variant<{}>",
                subtype.map(|s| s.as_str()).unwrap_or("unknown")
            ),
            SchemaNode::Array { items } => {
                let inner = items
                    .iter()
                    .map(|item| match item.subtype() {
                        Some(subtype) => subtype.as_str().to_string(),
                        None => item.label(),
                    })
                    .join("|");
                format!("array<{inner}>")
            }
            SchemaNode::Object { properties } => format!("object{{{}}}", properties.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredColumn {
    pub name: String,
    pub declared_type: DeclaredType,
    /// `None` when inference for this column failed and was contained.
    #[serde(default)]
    pub schema: Option<SchemaNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredSchema {
    pub columns: Vec<InferredColumn>,
}

/// One display row produced by [`InferredSchema::flatten`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPath {
    pub path: String,
    pub declared: String,
    pub shape: String,
}

impl InferredSchema {
    pub fn column(&self, name: &str) -> Option<&InferredColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn node(&self, name: &str) -> Option<&SchemaNode> {
        self.column(name).and_then(|column| column.schema.as_ref())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Flattens nested object properties into dotted paths, in column order.
    pub fn flatten(&self) -> Vec<SchemaPath> {
        let mut rows = Vec::new();
        for column in &self.columns {
            match &column.schema {
                Some(node) => {
                    flatten_node(&column.name, column.declared_type.as_str(), node, &mut rows)
                }
                None => rows.push(SchemaPath {
                    path: column.name.clone(),
                    declared: column.declared_type.as_str().to_string(),
                    shape: "unresolved".to_string(),
                }),
            }
        }
        rows
    }
}

fn flatten_node(path: &str, declared: &str, node: &SchemaNode, rows: &mut Vec<SchemaPath>) {
    rows.push(SchemaPath {
        path: path.to_string(),
        declared: declared.to_string(),
        shape: node.label(),
    });
    if let Some(properties) = node.properties() {
        for (key, child) in properties {
            flatten_node(&format!("{path}.{key}"), "variant", child, rows);
        }
    }
}
