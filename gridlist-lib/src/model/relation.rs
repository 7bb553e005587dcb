//! Relation metadata types

use serde::Deserialize;
use serde::Serialize;

use super::EntityDefinition;
use super::Value;
use crate::error::ConfigurationError;
use crate::util::snake_case;

/// Cardinality class of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// The parent holds a foreign key to one related record.
    BelongsTo,
    /// One related record holds a foreign key to the parent.
    HasOne,
    /// Many related records hold a foreign key to the parent.
    HasMany,
    /// Many related records joined through a pivot table.
    BelongsToMany,
    /// Related records reached through an intermediate table.
    HasManyThrough,
    /// Polymorphic "any type" owner. Not supported for computed selects.
    MorphTo,
    /// One polymorphic child.
    MorphOne,
    /// Many polymorphic children.
    MorphMany,
    /// Polymorphic many-to-many from the owning side.
    MorphToMany,
    /// Polymorphic many-to-many from the related side.
    MorphedByMany,
    /// Single file attachment.
    AttachOne,
    /// Multiple file attachments.
    AttachMany,
}

impl RelationKind {
    /// Returns `true` for relations that resolve to a collection.
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            RelationKind::HasMany
                | RelationKind::BelongsToMany
                | RelationKind::MorphToMany
                | RelationKind::MorphedByMany
                | RelationKind::MorphMany
                | RelationKind::AttachMany
                | RelationKind::HasManyThrough
        )
    }
}

/// Definition of a relation on an entity.
///
/// Key names default to the usual conventions and can be overridden with the
/// `with_*` methods.
///
/// # Example
///
/// ```
/// use gridlist_lib::model::{RelationDefinition, RelationKind};
///
/// let genres = RelationDefinition::belongs_to_many("Genre", "genres", "movies_genres");
/// assert_eq!(genres.kind, RelationKind::BelongsToMany);
/// assert!(genres.kind.is_multi());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDefinition {
    /// The relation type.
    pub kind: RelationKind,

    /// The related entity (model) name.
    pub entity: String,

    /// The related table.
    pub table: String,

    /// Primary key of the related table.
    #[serde(default = "default_key")]
    pub key: String,

    /// Foreign key column (side depends on the kind).
    #[serde(default)]
    pub foreign_key: Option<String>,

    /// Pivot (junction) table for many-to-many kinds.
    #[serde(default)]
    pub pivot_table: Option<String>,

    /// Pivot column referencing the parent.
    #[serde(default)]
    pub parent_pivot_key: Option<String>,

    /// Pivot column referencing the related record.
    #[serde(default)]
    pub related_pivot_key: Option<String>,

    /// Morph prefix for polymorphic kinds (`{name}_id` / `{name}_type`).
    #[serde(default)]
    pub morph_name: Option<String>,

    /// Intermediate table for has-many-through.
    #[serde(default)]
    pub through_table: Option<String>,

    /// Column on the intermediate table referencing the parent.
    #[serde(default)]
    pub through_key: Option<String>,

    /// Column on the related table referencing the intermediate table.
    #[serde(default)]
    pub through_related_key: Option<String>,
}

fn default_key() -> String {
    "id".to_string()
}

/// Table holding file attachments.
pub const ATTACHMENT_TABLE: &str = "system_files";

impl RelationDefinition {
    /// Creates a relation of the given kind.
    pub fn new(kind: RelationKind, entity: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            kind,
            entity: entity.into(),
            table: table.into(),
            key: default_key(),
            foreign_key: None,
            pivot_table: None,
            parent_pivot_key: None,
            related_pivot_key: None,
            morph_name: None,
            through_table: None,
            through_key: None,
            through_related_key: None,
        }
    }

    /// Creates a belongs-to relation.
    pub fn belongs_to(entity: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(RelationKind::BelongsTo, entity, table)
    }

    /// Creates a has-one relation.
    pub fn has_one(entity: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(RelationKind::HasOne, entity, table)
    }

    /// Creates a has-many relation.
    pub fn has_many(entity: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(RelationKind::HasMany, entity, table)
    }

    /// Creates a belongs-to-many relation through `pivot_table`.
    pub fn belongs_to_many(
        entity: impl Into<String>,
        table: impl Into<String>,
        pivot_table: impl Into<String>,
    ) -> Self {
        Self::new(RelationKind::BelongsToMany, entity, table).with_pivot_table(pivot_table)
    }

    /// Creates a polymorphic morph-to relation.
    pub fn morph_to(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(RelationKind::MorphTo, "", "").with_morph_name(name)
    }

    /// Creates a morph-many relation.
    pub fn morph_many(
        entity: impl Into<String>,
        table: impl Into<String>,
        morph_name: impl Into<String>,
    ) -> Self {
        Self::new(RelationKind::MorphMany, entity, table).with_morph_name(morph_name)
    }

    /// Creates a single attachment relation.
    pub fn attach_one() -> Self {
        Self::new(RelationKind::AttachOne, "File", ATTACHMENT_TABLE)
    }

    /// Creates a multiple attachment relation.
    pub fn attach_many() -> Self {
        Self::new(RelationKind::AttachMany, "File", ATTACHMENT_TABLE)
    }

    /// Sets the related primary key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets the foreign key column.
    pub fn with_foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    /// Sets the pivot table.
    pub fn with_pivot_table(mut self, table: impl Into<String>) -> Self {
        self.pivot_table = Some(table.into());
        self
    }

    /// Sets both pivot keys.
    pub fn with_pivot_keys(
        mut self,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        self.parent_pivot_key = Some(parent_key.into());
        self.related_pivot_key = Some(related_key.into());
        self
    }

    /// Sets the morph prefix.
    pub fn with_morph_name(mut self, name: impl Into<String>) -> Self {
        self.morph_name = Some(name.into());
        self
    }

    /// Sets the intermediate table and its keys for has-many-through.
    pub fn with_through(
        mut self,
        table: impl Into<String>,
        through_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        self.through_table = Some(table.into());
        self.through_key = Some(through_key.into());
        self.through_related_key = Some(related_key.into());
        self
    }

    /// Builds the correlation between `parent` rows and this relation's rows.
    ///
    /// The result is what an existence or scalar sub-query needs: the `from`
    /// clause (with pivot joins), the constraint tying it to the parent table,
    /// and the values bound by that constraint.
    pub fn correlate(
        &self,
        name: &str,
        parent: &EntityDefinition,
    ) -> Result<Correlation, ConfigurationError> {
        let p = &parent.table;
        let pk = &parent.primary_key;
        let r = &self.table;
        let parent_fk = || format!("{}_id", snake_case(&parent.name));

        let correlation = match self.kind {
            RelationKind::MorphTo => {
                return Err(ConfigurationError::UnsupportedMorphTo {
                    relation: name.to_string(),
                });
            }
            RelationKind::BelongsTo => {
                let fk = self
                    .foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", snake_case(name)));
                Correlation::new(r.clone(), format!("{p}.{fk} = {r}.{}", self.key))
            }
            RelationKind::HasOne | RelationKind::HasMany => {
                let fk = self.foreign_key.clone().unwrap_or_else(parent_fk);
                Correlation::new(r.clone(), format!("{r}.{fk} = {p}.{pk}"))
            }
            RelationKind::BelongsToMany => {
                let pivot = self.require_pivot(name)?;
                let parent_key = self.parent_pivot_key.clone().unwrap_or_else(parent_fk);
                let related_key = self
                    .related_pivot_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", snake_case(&self.entity)));
                Correlation::new(
                    format!(
                        "{r} inner join {pivot} on {r}.{} = {pivot}.{related_key}",
                        self.key
                    ),
                    format!("{pivot}.{parent_key} = {p}.{pk}"),
                )
            }
            RelationKind::HasManyThrough => {
                let through = self.require(name, &self.through_table, "through_table")?;
                let through_key = self.through_key.clone().unwrap_or_else(parent_fk);
                let related_key = self.require(name, &self.through_related_key, "through_related_key")?;
                Correlation::new(
                    format!("{r} inner join {through} on {through}.id = {r}.{related_key}"),
                    format!("{through}.{through_key} = {p}.{pk}"),
                )
            }
            RelationKind::MorphOne | RelationKind::MorphMany => {
                let morph = self.morph_prefix(name);
                Correlation::new(
                    r.clone(),
                    format!("{r}.{morph}_id = {p}.{pk} and {r}.{morph}_type = ?"),
                )
                .bind(parent.name.clone())
            }
            RelationKind::MorphToMany => {
                let pivot = self.require_pivot(name)?;
                let morph = self.morph_prefix(name);
                let related_key = self
                    .related_pivot_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", snake_case(&self.entity)));
                Correlation::new(
                    format!(
                        "{r} inner join {pivot} on {r}.{} = {pivot}.{related_key}",
                        self.key
                    ),
                    format!("{pivot}.{morph}_id = {p}.{pk} and {pivot}.{morph}_type = ?"),
                )
                .bind(parent.name.clone())
            }
            RelationKind::MorphedByMany => {
                let pivot = self.require_pivot(name)?;
                let morph = self.morph_prefix(name);
                let parent_key = self.parent_pivot_key.clone().unwrap_or_else(parent_fk);
                Correlation::new(
                    format!("{r} inner join {pivot} on {r}.{} = {pivot}.{morph}_id", self.key),
                    format!("{pivot}.{parent_key} = {p}.{pk} and {pivot}.{morph}_type = ?"),
                )
                .bind(self.entity.clone())
            }
            RelationKind::AttachOne | RelationKind::AttachMany => Correlation::new(
                r.clone(),
                format!(
                    "{r}.attachment_id = {p}.{pk} and {r}.attachment_type = ? and {r}.field = ?"
                ),
            )
            .bind(parent.name.clone())
            .bind(name.to_string()),
        };

        Ok(correlation)
    }

    fn morph_prefix(&self, name: &str) -> String {
        self.morph_name.clone().unwrap_or_else(|| name.to_string())
    }

    fn require_pivot(&self, name: &str) -> Result<String, ConfigurationError> {
        self.require(name, &self.pivot_table, "pivot_table")
    }

    fn require(
        &self,
        name: &str,
        value: &Option<String>,
        key: &'static str,
    ) -> Result<String, ConfigurationError> {
        value
            .clone()
            .ok_or_else(|| ConfigurationError::IncompleteRelation {
                relation: name.to_string(),
                key,
            })
    }
}

/// The pieces of a sub-query correlated with the parent table.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    /// `from` clause including any pivot/intermediate joins.
    pub from: String,
    /// Predicate tying related rows to the current parent row.
    pub constraint: String,
    /// Values bound by `constraint`, in placeholder order.
    pub bindings: Vec<Value>,
}

impl Correlation {
    fn new(from: String, constraint: String) -> Self {
        Self {
            from,
            constraint,
            bindings: Vec::new(),
        }
    }

    fn bind(mut self, value: impl Into<Value>) -> Self {
        self.bindings.push(value.into());
        self
    }
}
