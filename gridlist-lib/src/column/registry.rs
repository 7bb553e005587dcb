//! Column registry and resolution snapshots

use indexmap::IndexMap;
use log::debug;

use super::ColumnConfig;
use super::ColumnDefinition;
use crate::error::ConfigurationError;
use crate::model::EntityDefinition;
use crate::services::AccessControl;

/// Ordered set of column definitions keyed by name.
///
/// Resolution runs as a pipeline of snapshots: each phase takes the previous
/// registry and returns a new one, so every phase can be checked on its own.
///
/// # Example
///
/// ```
/// use gridlist_lib::column::ColumnRegistry;
///
/// let mut registry = ColumnRegistry::new();
/// registry.define_column("title", "Title").searchable = true;
/// registry.define_column("year", "Year");
///
/// let reordered = registry.reordered(&["year".to_string()]);
/// assert_eq!(reordered.names(), vec!["year", "title"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRegistry {
    columns: IndexMap<String, ColumnDefinition>,
}

impl ColumnRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a text column, replacing any column with the same name, and
    /// returns it for further configuration.
    pub fn define_column(
        &mut self,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> &mut ColumnDefinition {
        let name = name.into();
        let column = ColumnDefinition::new(name.clone(), label);
        let (index, _) = self.columns.insert_full(name, column);
        &mut self.columns[index]
    }

    /// Inserts a prepared definition, replacing any column with the same name.
    pub fn insert(&mut self, column: ColumnDefinition) {
        self.columns.insert(column.name.clone(), column);
    }

    /// Registers columns from declarative configuration.
    ///
    /// Entries guarded by permissions the current user lacks are skipped.
    pub fn add_columns<I, K>(
        &mut self,
        columns: I,
        access: &dyn AccessControl,
    ) -> Result<(), ConfigurationError>
    where
        I: IntoIterator<Item = (K, ColumnConfig)>,
        K: Into<String>,
    {
        for (name, config) in columns {
            let name = name.into();
            let permissions = config.permissions();
            if !permissions.is_empty() && !access.user_can_access(&permissions) {
                debug!("Skipping column '{}': permission denied", name);
                continue;
            }
            self.insert(ColumnDefinition::from_config(name, config)?);
        }
        Ok(())
    }

    /// Removes a column. Does nothing if it is not registered.
    pub fn remove_column(&mut self, name: &str) {
        self.columns.shift_remove(name);
    }

    /// Returns the column with the given name.
    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.get(name)
    }

    /// Returns a mutable reference to the column with the given name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ColumnDefinition> {
        self.columns.get_mut(name)
    }

    /// Returns the column or an unknown column error.
    pub fn column(&self, name: &str) -> Result<&ColumnDefinition, ConfigurationError> {
        self.get(name).ok_or_else(|| ConfigurationError::UnknownColumn {
            column: name.to_string(),
        })
    }

    /// Returns `true` if the column is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Iterates the columns in order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.values()
    }

    /// Column names in order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if no columns are registered.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    // =========================================================================
    // Resolution phases
    // =========================================================================

    /// Declared phase: programmatic columns, then model-declared columns, then
    /// the list configuration.
    pub fn declare(
        programmatic: &ColumnRegistry,
        entity: &EntityDefinition,
        configured: &IndexMap<String, ColumnConfig>,
        access: &dyn AccessControl,
    ) -> Result<ColumnRegistry, ConfigurationError> {
        let mut registry = programmatic.clone();

        if let Some(declared) = entity.declared_columns() {
            registry.add_columns(declared.clone(), access)?;
        }

        let has_columns = !configured.is_empty() || !registry.is_empty();
        if !has_columns {
            return Err(ConfigurationError::MissingColumns {
                model: entity.name.clone(),
            });
        }

        registry.add_columns(configured.clone(), access)?;
        Ok(registry)
    }

    /// Purged phase: drops permanently hidden columns.
    pub fn purged(&self) -> ColumnRegistry {
        ColumnRegistry {
            columns: self
                .columns
                .iter()
                .filter(|(_, column)| !column.hidden)
                .map(|(name, column)| (name.clone(), column.clone()))
                .collect(),
        }
    }

    /// Reordered phase: the named columns first, in the given order, then the
    /// rest in their current order. Unknown names are ignored.
    pub fn reordered(&self, order: &[String]) -> ColumnRegistry {
        let mut columns = IndexMap::with_capacity(self.columns.len());
        for name in order {
            if let Some(column) = self.columns.get(name) {
                columns.insert(name.clone(), column.clone());
            }
        }
        for (name, column) in &self.columns {
            if !columns.contains_key(name) {
                columns.insert(name.clone(), column.clone());
            }
        }
        ColumnRegistry { columns }
    }

    /// The visible column set.
    ///
    /// With an override, exactly the listed columns that exist are returned, in
    /// the listed order, and marked visible. Otherwise every column that is not
    /// invisible is returned.
    pub fn visible(&self, visible_override: Option<&[String]>) -> ColumnRegistry {
        let columns = match visible_override {
            Some(names) if !names.is_empty() => {
                let mut columns = IndexMap::new();
                for name in names {
                    if let Some(column) = self.columns.get(name) {
                        let mut column = column.clone();
                        column.invisible = false;
                        columns.insert(name.clone(), column);
                    }
                }
                columns
            }
            _ => self
                .columns
                .iter()
                .filter(|(_, column)| !column.invisible)
                .map(|(name, column)| (name.clone(), column.clone()))
                .collect(),
        };
        ColumnRegistry { columns }
    }
}

impl<'a> IntoIterator for &'a ColumnRegistry {
    type Item = &'a ColumnDefinition;
    type IntoIter = indexmap::map::Values<'a, String, ColumnDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.values()
    }
}
