//! Entity definition bound to a list

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use super::RelationDefinition;
use crate::column::ColumnConfig;
use crate::error::ConfigurationError;

/// Describes the model a list is bound to: its table, key and relations.
///
/// Relations are kept in declaration order. An entity may also declare its own
/// list columns, which are registered ahead of the list configuration.
///
/// # Example
///
/// ```
/// use gridlist_lib::model::{EntityDefinition, RelationDefinition};
///
/// let movie = EntityDefinition::new("Movie", "movies")
///     .with_relation("genres", RelationDefinition::belongs_to_many("Genre", "genres", "movies_genres"));
///
/// assert!(movie.relation("genres").is_some());
/// assert!(movie.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefinition {
    /// Model name, used as the morph type of the entity.
    pub name: String,

    /// Backing table.
    pub table: String,

    /// Primary key column.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Relations by name.
    #[serde(default)]
    pub relations: IndexMap<String, RelationDefinition>,

    /// Columns declared by the model itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<IndexMap<String, ColumnConfig>>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl EntityDefinition {
    /// Creates an entity with no relations, keyed by `id`.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: default_primary_key(),
            relations: IndexMap::new(),
            columns: None,
        }
    }

    /// Sets the primary key column.
    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    /// Adds a relation.
    pub fn with_relation(mut self, name: impl Into<String>, relation: RelationDefinition) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    /// Adds a model-declared column.
    pub fn with_column(mut self, name: impl Into<String>, config: impl Into<ColumnConfig>) -> Self {
        self.columns
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), config.into());
        self
    }

    /// Returns the relation with the given name.
    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.get(name)
    }

    /// Returns `true` if the entity defines the relation.
    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Returns the relation or an unknown relation error naming this entity.
    pub fn require_relation(&self, name: &str) -> Result<&RelationDefinition, ConfigurationError> {
        self.relation(name)
            .ok_or_else(|| ConfigurationError::unknown_relation(&self.name, name))
    }

    /// Returns the model-declared columns, if any.
    pub fn declared_columns(&self) -> Option<&IndexMap<String, ColumnConfig>> {
        self.columns.as_ref()
    }

    /// Checks the definition is usable as a list model.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let reason = if self.name.trim().is_empty() {
            Some("model name is empty")
        } else if self.table.trim().is_empty() {
            Some("table name is empty")
        } else if self.primary_key.trim().is_empty() {
            Some("primary key is empty")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(ConfigurationError::InvalidModel {
                model: self.name.clone(),
                reason: reason.to_string(),
            });
        }

        for (name, relation) in &self.relations {
            if relation.kind != super::RelationKind::MorphTo && relation.table.trim().is_empty() {
                return Err(ConfigurationError::InvalidModel {
                    model: self.name.clone(),
                    reason: format!("relation '{name}' has no table"),
                });
            }
        }

        Ok(())
    }
}
