//! Custom column types

use std::collections::HashMap;

use crate::column::ColumnDefinition;
use crate::error::Error;
use crate::model::Record;
use crate::model::Value;

/// Renders a cell of a custom column type from its raw value.
pub trait ColumnTypeProvider {
    fn evaluate(
        &self,
        value: &Value,
        column: &ColumnDefinition,
        record: &Record,
    ) -> Result<String, Error>;
}

impl<F> ColumnTypeProvider for F
where
    F: Fn(&Value, &ColumnDefinition, &Record) -> Result<String, Error>,
{
    fn evaluate(
        &self,
        value: &Value,
        column: &ColumnDefinition,
        record: &Record,
    ) -> Result<String, Error> {
        self(value, column, record)
    }
}

/// Custom column types by name.
///
/// # Example
///
/// ```
/// use gridlist_lib::column::ColumnDefinition;
/// use gridlist_lib::error::Error;
/// use gridlist_lib::eval::ColumnTypeRegistry;
/// use gridlist_lib::model::{Record, Value};
///
/// fn shout(value: &Value, _: &ColumnDefinition, _: &Record) -> Result<String, Error> {
///     Ok(value.to_text().to_uppercase())
/// }
///
/// let mut types = ColumnTypeRegistry::new();
/// types.register("shout", shout);
/// assert!(types.contains("shout"));
/// ```
#[derive(Default)]
pub struct ColumnTypeRegistry {
    types: HashMap<String, Box<dyn ColumnTypeProvider>>,
}

impl ColumnTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any type of the same name.
    pub fn register(&mut self, name: impl Into<String>, provider: impl ColumnTypeProvider + 'static) {
        self.types.insert(name.into(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ColumnTypeProvider> {
        self.types.get(name).map(|provider| provider.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}

impl std::fmt::Debug for ColumnTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnTypeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}
