use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// A raw `{name, value}` pair as supplied by a caller.
///
/// Used both as input when writing an instance and as an equality predicate
/// when querying instances by their data. Values are opaque strings; a JSON
/// number or boolean is accepted and kept as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyValue {
    pub name: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

impl PropertyValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string, number or boolean value, found {other}"
        ))),
    }
}
