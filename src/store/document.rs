// Configuration document types
// The persisted JSON object and the partial update carried by a POST

use serde::Serialize;
use serde_json::{Map, Value};

pub const FREE_FIELD: &str = "free";
pub const ORDER_FIELD: &str = "order";

/// Persisted configuration document
///
/// Always an object holding `free` and `order` lists. Any other keys written
/// by earlier deployments are kept as-is and round-trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    fields: Map<String, Value>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::from_map(Map::new())
    }
}

impl ConfigDocument {
    /// Wrap a parsed object, filling in missing list fields
    pub fn from_map(mut fields: Map<String, Value>) -> Self {
        for name in [FREE_FIELD, ORDER_FIELD] {
            fields
                .entry(name)
                .or_insert_with(|| Value::Array(Vec::new()));
        }
        Self { fields }
    }

    /// Parse a stored document; `None` when the text is not a JSON object
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(text).ok()? {
            Value::Object(map) => Some(Self::from_map(map)),
            _ => None,
        }
    }

    /// Overwrite only the fields present in the update
    pub fn apply(&mut self, update: ListUpdate) {
        if let Some(free) = update.free {
            self.fields.insert(FREE_FIELD.to_string(), Value::Array(free));
        }
        if let Some(order) = update.order {
            self.fields.insert(ORDER_FIELD.to_string(), Value::Array(order));
        }
    }
}

/// Replacement lists supplied by a write request
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListUpdate {
    pub free: Option<Vec<Value>>,
    pub order: Option<Vec<Value>>,
}

/// Coerce a JSON value into a list of its elements
///
/// Arrays keep their elements in order, strings split into characters and
/// objects yield their keys. Scalars and `null` have no elements and are
/// rejected.
pub fn coerce_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::String(s) => Some(s.chars().map(|c| Value::String(c.to_string())).collect()),
        Value::Object(map) => Some(map.into_iter().map(|(k, _)| Value::String(k)).collect()),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}
