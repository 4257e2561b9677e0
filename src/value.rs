//! Runtime value classification for sampled rows.
//!
//! Every inference path asks the same question of a sampled value: is it
//! null, a list, a nested document, or one of the JSON primitives? This module
//! answers it once with [`classify`], a total function over
//! [`serde_json::Value`], so the resolvers never pattern-match raw values
//! themselves.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The shape tag of a single sampled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Array,
    Object,
    Boolean,
    Number,
    String,
}

/// A resolved, non-null subtype of a variant column or array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    Object,
    Array,
    Boolean,
    Number,
    String,
}

pub fn classify(value: &Value) -> ValueKind {
    match value {
        Value::Null => ValueKind::Null,
        Value::Array(_) => ValueKind::Array,
        Value::Object(_) => ValueKind::Object,
        Value::Bool(_) => ValueKind::Boolean,
        Value::Number(_) => ValueKind::Number,
        Value::String(_) => ValueKind::String,
    }
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
        }
    }

    /// Maps the kind onto a subtype; `null` carries no subtype.
    pub fn subtype(self) -> Option<Subtype> {
        match self {
            ValueKind::Null => None,
            ValueKind::Array => Some(Subtype::Array),
            ValueKind::Object => Some(Subtype::Object),
            ValueKind::Boolean => Some(Subtype::Boolean),
            ValueKind::Number => Some(Subtype::Number),
            ValueKind::String => Some(Subtype::String),
        }
    }
}

impl Subtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subtype::Object => "object",
            Subtype::Array => "array",
            Subtype::Boolean => "boolean",
            Subtype::Number => "number",
            Subtype::String => "string",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_covers_every_json_shape() {
        assert_eq!(classify(&json!(null)), ValueKind::Null);
        assert_eq!(classify(&json!([1, 2])), ValueKind::Array);
        assert_eq!(classify(&json!({"a": 1})), ValueKind::Object);
        assert_eq!(classify(&json!(true)), ValueKind::Boolean);
        assert_eq!(classify(&json!(4.5)), ValueKind::Number);
        assert_eq!(classify(&json!("x")), ValueKind::String);
    }

    #[test]
    fn null_has_no_subtype() {
        assert_eq!(ValueKind::Null.subtype(), None);
        assert_eq!(ValueKind::Number.subtype(), Some(Subtype::Number));
    }

    #[test]
    fn subtype_serializes_lowercase() {
        let rendered = serde_json::to_string(&Subtype::Boolean).expect("serialize subtype");
        assert_eq!(rendered, "\"boolean\"");
    }
}
