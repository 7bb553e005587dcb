//! Declarative column configuration

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value as JsonValue;

/// A column entry as written in a list definition.
///
/// Either a bare label (`"title": "Title"`) or a map of options
/// (`"title": { "label": "Title", "searchable": true }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnConfig {
    /// Shorthand carrying only the label.
    Label(String),
    /// Full option map.
    Options(Map<String, JsonValue>),
}

impl ColumnConfig {
    /// Returns the configured label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            ColumnConfig::Label(label) => Some(label),
            ColumnConfig::Options(map) => map.get("label").and_then(JsonValue::as_str),
        }
    }

    /// Returns a raw option.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        match self {
            ColumnConfig::Label(_) => None,
            ColumnConfig::Options(map) => map.get(key),
        }
    }

    /// Returns the permissions guarding the column, accepting a single string or a list.
    pub fn permissions(&self) -> Vec<String> {
        match self.get("permissions") {
            Some(JsonValue::String(permission)) if !permission.is_empty() => {
                vec![permission.clone()]
            }
            Some(JsonValue::Array(items)) => items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Converts the entry into its option map, folding the label shorthand in.
    pub fn into_options(self) -> Map<String, JsonValue> {
        match self {
            ColumnConfig::Label(label) => {
                let mut map = Map::new();
                map.insert("label".to_string(), JsonValue::String(label));
                map
            }
            ColumnConfig::Options(map) => map,
        }
    }
}

impl From<&str> for ColumnConfig {
    fn from(label: &str) -> Self {
        ColumnConfig::Label(label.to_string())
    }
}

impl From<String> for ColumnConfig {
    fn from(label: String) -> Self {
        ColumnConfig::Label(label)
    }
}

impl From<Map<String, JsonValue>> for ColumnConfig {
    fn from(map: Map<String, JsonValue>) -> Self {
        ColumnConfig::Options(map)
    }
}

impl From<JsonValue> for ColumnConfig {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::String(label) => ColumnConfig::Label(label),
            JsonValue::Object(map) => ColumnConfig::Options(map),
            _ => ColumnConfig::Options(Map::new()),
        }
    }
}
