//! Dynamic entity record

use std::collections::HashMap;

use serde::Serialize;
use serde::ser::SerializeMap;

use super::EntityDefinition;
use super::Value;

/// A record fetched for a list row.
///
/// Attributes and loaded relations are kept apart: a relation that was not
/// eager loaded is simply absent, which lets column evaluation tell "not
/// loaded" from "loaded but empty".
///
/// # Example
///
/// ```
/// use gridlist_lib::model::{Record, Value};
///
/// let genre = Record::new("Genre").set("title", "Horror");
/// let movie = Record::new("Movie")
///     .set("id", 1i64)
///     .set("title", "Alien")
///     .with_relation("genres", vec![genre]);
///
/// assert_eq!(movie.get("title"), Some(&Value::from("Alien")));
/// assert!(movie.has_relation("genres"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The entity (model) name.
    pub(crate) entity_name: String,

    /// Name of the primary key attribute.
    pub(crate) key_name: String,

    /// The attribute values.
    pub(crate) attributes: HashMap<String, Value>,

    /// Loaded relations: `Value::Record`, `Value::Records` or `Value::Null`.
    pub(crate) relations: HashMap<String, Value>,
}

impl Record {
    /// Creates a new empty record for the given entity, keyed by `id`.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            key_name: "id".to_string(),
            attributes: HashMap::new(),
            relations: HashMap::new(),
        }
    }

    /// Builds a record from a JSON object, routing keys that name relations of
    /// `entity` into the relation map.
    ///
    /// Related objects may carry a nested `pivot` object, which becomes the
    /// related record's `pivot` relation.
    pub fn from_json(entity: &EntityDefinition, json: serde_json::Value) -> Self {
        let mut record = Record::new(entity.name.clone());
        record.key_name = entity.primary_key.clone();

        let serde_json::Value::Object(map) = json else {
            return record;
        };

        for (key, value) in map {
            match entity.relation(&key) {
                Some(relation) => {
                    let related_name = relation.entity.clone();
                    let loaded = match value {
                        serde_json::Value::Array(items) => Value::Records(
                            items
                                .into_iter()
                                .map(|item| Record::related_from_json(&related_name, item))
                                .collect(),
                        ),
                        serde_json::Value::Null => Value::Null,
                        item => Value::Record(Box::new(Record::related_from_json(
                            &related_name,
                            item,
                        ))),
                    };
                    record.relations.insert(key, loaded);
                }
                None => {
                    record.attributes.insert(key, Value::from_json(value));
                }
            }
        }

        record
    }

    fn related_from_json(entity_name: &str, json: serde_json::Value) -> Self {
        let mut record = Record::new(entity_name);
        let serde_json::Value::Object(map) = json else {
            return record;
        };
        for (key, value) in map {
            if key == "pivot" {
                let pivot = Record::related_from_json("pivot", value);
                record.relations.insert(key, Value::Record(Box::new(pivot)));
            } else {
                record.attributes.insert(key, Value::from_json(value));
            }
        }
        record
    }

    // =========================================================================
    // Metadata accessors
    // =========================================================================

    /// Returns the entity name.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Returns the primary key value, if set.
    pub fn key(&self) -> Option<&Value> {
        self.attributes.get(&self.key_name)
    }

    /// Sets the name of the primary key attribute.
    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    // =========================================================================
    // Attribute access
    // =========================================================================

    /// Returns a reference to the attribute value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Returns `true` if the record has the given attribute.
    pub fn contains(&self, field: &str) -> bool {
        self.attributes.contains_key(field)
    }

    /// Returns a reference to all attributes.
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Sets an attribute value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    /// Inserts an attribute value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(field.into(), value.into());
    }

    /// Removes an attribute and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.attributes.remove(field)
    }

    // =========================================================================
    // Relation access
    // =========================================================================

    /// Returns the loaded relation, if it was loaded.
    pub fn relation(&self, name: &str) -> Option<&Value> {
        self.relations.get(name)
    }

    /// Returns `true` if the relation was loaded (even if it is empty).
    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Returns a reference to all loaded relations.
    pub fn relations(&self) -> &HashMap<String, Value> {
        &self.relations
    }

    /// Attaches a loaded relation (builder pattern).
    pub fn with_relation(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.relations.insert(name.into(), value.into());
        self
    }

    /// Attaches a loaded relation.
    pub fn set_relation(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.relations.insert(name.into(), value.into());
    }

    /// Drops every loaded relation not accepted by `keep`.
    pub fn retain_relations(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.relations.retain(|name, _| keep(name));
    }

    // =========================================================================
    // Path access
    // =========================================================================

    /// Resolves a path of segments against the record.
    ///
    /// The first segment names an attribute or a loaded relation; later
    /// segments walk into nested records and JSON objects. Missing steps
    /// resolve to [`Value::Null`].
    pub fn value_at(&self, path: &[String]) -> Value {
        let Some((first, rest)) = path.split_first() else {
            return Value::Null;
        };

        let head = self
            .attributes
            .get(first)
            .or_else(|| self.relations.get(first));

        match head {
            Some(value) => descend(value, rest),
            None => Value::Null,
        }
    }
}

fn descend(value: &Value, path: &[String]) -> Value {
    let Some((first, rest)) = path.split_first() else {
        return value.clone();
    };

    match value {
        Value::Record(record) => {
            let mut full = vec![first.clone()];
            full.extend_from_slice(rest);
            record.value_at(&full)
        }
        Value::Json(json) => match json.get(first.as_str()) {
            Some(inner) => descend(&Value::from_json(inner.clone()), rest),
            None => Value::Null,
        },
        Value::List(items) => match first.parse::<usize>().ok().and_then(|i| items.get(i)) {
            Some(inner) => descend(inner, rest),
            None => Value::Null,
        },
        _ => Value::Null,
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new("")
    }
}

/// Serializes as one flat object: attributes followed by loaded relations.
impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + self.relations.len()))?;
        let mut keys: Vec<_> = self.attributes.keys().collect();
        keys.sort();
        for key in keys {
            map.serialize_entry(key, &self.attributes[key])?;
        }
        let mut relations: Vec<_> = self.relations.keys().collect();
        relations.sort();
        for key in relations {
            map.serialize_entry(key, &self.relations[key])?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_value_at_attribute() {
        let record = Record::new("Movie").set("title", "Alien");
        assert_eq!(record.value_at(&path(&["title"])), Value::from("Alien"));
        assert_eq!(record.value_at(&path(&["missing"])), Value::Null);
    }

    #[test]
    fn test_value_at_nested_json() {
        let record = Record::new("Movie").set(
            "meta",
            serde_json::json!({"seo": {"title": "Alien (1979)"}}),
        );
        assert_eq!(
            record.value_at(&path(&["meta", "seo", "title"])),
            Value::from("Alien (1979)")
        );
    }

    #[test]
    fn test_value_at_relation() {
        let director = Record::new("Director").set("name", "Ridley Scott");
        let record = Record::new("Movie").with_relation("director", director);
        assert_eq!(
            record.value_at(&path(&["director", "name"])),
            Value::from("Ridley Scott")
        );
    }

    #[test]
    fn test_serialize_flat() {
        let record = Record::new("Movie").set("id", 3i64).set("title", "Heat");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "title": "Heat"}));
    }
}
