//! Configuration error types

/// Errors raised when the list definition cannot be honoured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// No entity definition was bound to the list.
    #[error("List widget '{widget}' has no model defined")]
    MissingModel { widget: String },

    /// The bound entity definition is unusable.
    #[error("Model '{model}' is not a valid list model: {reason}")]
    InvalidModel { model: String, reason: String },

    /// Neither declared nor registered columns exist.
    #[error("List used by '{model}' has no columns defined")]
    MissingColumns { model: String },

    /// A column was requested by name but has no definition.
    #[error("No definition for column '{column}'")]
    UnknownColumn { column: String },

    /// A column references a relation the entity does not define.
    #[error("Model '{model}' does not contain a definition for relation '{relation}'")]
    UnknownRelation { model: String, relation: String },

    /// A computed select was requested over a polymorphic "any type" relation.
    #[error("The relationship morphTo is not supported for list columns (relation '{relation}')")]
    UnsupportedMorphTo { relation: String },

    /// The relation lacks keys needed to correlate a sub-query.
    #[error("Relation '{relation}' is missing required key '{key}'")]
    IncompleteRelation { relation: String, key: &'static str },

    /// A column type is neither built in nor registered.
    #[error("List column type \"{column_type}\" could not be found. {hint}")]
    UnknownColumnType { column_type: String, hint: String },

    /// The configured search scope is not registered.
    #[error("Search scope '{scope}' is not registered")]
    UnknownSearchScope { scope: String },

    /// A selectable column has no static options and no option provider.
    #[error("No options available for selectable column '{column}'")]
    MissingOptions { column: String },

    /// A column configuration entry could not be read.
    #[error("Invalid configuration for column '{column}': {message}")]
    InvalidColumn { column: String, message: String },
}

impl ConfigurationError {
    /// Creates an unknown column type error, adding the relation hint where it applies.
    pub fn unknown_column_type(column_type: impl Into<String>) -> Self {
        let column_type = column_type.into();
        let hint = if column_type == "relation" {
            "Type: relation is not supported, instead use the relation property to specify a \
             relationship to pull the value from and set the type to the type of the value expected."
                .to_string()
        } else {
            String::new()
        };
        Self::UnknownColumnType { column_type, hint }
    }

    /// Creates an unknown relation error.
    pub fn unknown_relation(model: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::UnknownRelation {
            model: model.into(),
            relation: relation.into(),
        }
    }
}
