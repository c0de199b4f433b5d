//! Records and identifiers.
//!
//! A [`Record`] is one row of a backend resource: an identifier plus an
//! arbitrary JSON object. The resource data store is the only owner of
//! `Record` values; every other component (reference index, list slices,
//! UI layers) holds [`Identifier`]s and looks records up on demand.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DataError;

/// Identifier of a record, unique within one resource.
///
/// Backends are free to use either integer or string primary keys, so both
/// are supported and serialize transparently (`42` or `"abc"` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl Identifier {
    /// Extract an identifier from a JSON value, if it is one.
    pub fn from_value(value: &Value) -> Option<Identifier> {
        match value {
            Value::Number(n) => n.as_i64().map(Identifier::Number),
            Value::String(s) => Some(Identifier::Text(s.clone())),
            _ => None,
        }
    }

    /// The JSON representation of this identifier.
    pub fn to_value(&self) -> Value {
        match self {
            Identifier::Number(n) => Value::from(*n),
            Identifier::Text(s) => Value::from(s.clone()),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Number(n)
    }
}

impl From<i32> for Identifier {
    fn from(n: i32) -> Self {
        Identifier::Number(n as i64)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Text(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::Text(s)
    }
}

/// One record of a resource: identifier plus arbitrary JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Identifier,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter, mostly useful in tests and seeds.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Merge a patch into this record, last write wins per field.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key == "id" {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Parse a record out of a JSON object. The object must carry an `id`
    /// field holding a string or integer.
    pub fn from_value(value: Value) -> Result<Record, DataError> {
        let Value::Object(mut fields) = value else {
            return Err(DataError::Validation(
                "record payload is not a JSON object".to_string(),
            ));
        };
        let id = fields
            .remove("id")
            .as_ref()
            .and_then(Identifier::from_value)
            .ok_or_else(|| {
                DataError::Validation("record payload has no usable 'id' field".to_string())
            })?;
        Ok(Record { id, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifier_from_value() {
        assert_eq!(Identifier::from_value(&json!(7)), Some(Identifier::Number(7)));
        assert_eq!(
            Identifier::from_value(&json!("abc")),
            Some(Identifier::Text("abc".to_string()))
        );
        assert_eq!(Identifier::from_value(&json!([1])), None);
    }

    #[test]
    fn identifier_serde_is_untagged() {
        let id: Identifier = serde_json::from_value(json!(12)).unwrap();
        assert_eq!(id, Identifier::Number(12));
        assert_eq!(serde_json::to_value(&id).unwrap(), json!(12));
    }

    #[test]
    fn record_from_value_extracts_id() {
        let record = Record::from_value(json!({"id": 3, "title": "hello"})).unwrap();
        assert_eq!(record.id, Identifier::Number(3));
        assert_eq!(record.get("title"), Some(&json!("hello")));
    }

    #[test]
    fn record_from_value_rejects_missing_id() {
        assert!(matches!(
            Record::from_value(json!({"title": "x"})),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn merge_is_last_write_wins_and_keeps_id() {
        let mut record = Record::new(1).with("title", "old").with("votes", 3);
        let mut patch = Map::new();
        patch.insert("title".to_string(), json!("new"));
        patch.insert("id".to_string(), json!(99));
        record.merge(&patch);
        assert_eq!(record.id, Identifier::Number(1));
        assert_eq!(record.get("title"), Some(&json!("new")));
        assert_eq!(record.get("votes"), Some(&json!(3)));
    }
}
