//! Column definition and display types

use serde::Serialize;
use serde::Serializer;
use serde_json::Map;
use serde_json::Value as JsonValue;

use super::ColumnConfig;
use crate::error::ConfigurationError;
use crate::model::Value;
use crate::util::array_to_name;
use crate::util::name_to_array;
use crate::util::studly_case;

/// Relation name reserved for pivot (join record) columns.
pub const PIVOT_RELATION: &str = "pivot";

/// Display transform applied to a column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ColumnType {
    /// Escaped text, lists joined with ", ".
    #[default]
    Text,
    /// Same as text.
    Number,
    /// Resized image rendered through a partial.
    Image,
    /// Boolean shown as a true/false label.
    Switch,
    /// Stripped, word-limited excerpt.
    Summary,
    /// Date and time.
    DateTime,
    /// Time of day.
    Time,
    /// Calendar date.
    Date,
    /// Relative "3 days ago" form.
    TimeSince,
    /// "Today at 10:15" form.
    TimeTense,
    /// Option label rendered through a partial.
    Selectable,
    /// Arbitrary partial.
    Partial,
    /// Colour swatch.
    ColorPicker,
    /// Looked up in the custom type registry.
    Custom(String),
}

impl ColumnType {
    /// Parses a type name. Unknown names become [`ColumnType::Custom`].
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "text" => ColumnType::Text,
            "number" => ColumnType::Number,
            "image" => ColumnType::Image,
            "switch" => ColumnType::Switch,
            "summary" => ColumnType::Summary,
            "datetime" => ColumnType::DateTime,
            "time" => ColumnType::Time,
            "date" => ColumnType::Date,
            "timesince" => ColumnType::TimeSince,
            "timetense" => ColumnType::TimeTense,
            "selectable" => ColumnType::Selectable,
            "partial" => ColumnType::Partial,
            "colorpicker" => ColumnType::ColorPicker,
            _ => ColumnType::Custom(name.to_string()),
        }
    }

    /// Returns the type name.
    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Image => "image",
            ColumnType::Switch => "switch",
            ColumnType::Summary => "summary",
            ColumnType::DateTime => "datetime",
            ColumnType::Time => "time",
            ColumnType::Date => "date",
            ColumnType::TimeSince => "timesince",
            ColumnType::TimeTense => "timetense",
            ColumnType::Selectable => "selectable",
            ColumnType::Partial => "partial",
            ColumnType::ColorPicker => "colorpicker",
            ColumnType::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single list column.
///
/// # Example
///
/// ```
/// use gridlist_lib::column::{ColumnDefinition, ColumnType};
///
/// let column = ColumnDefinition::new("released_at", "Released")
///     .display_as(ColumnType::Date)
///     .with_format("%Y");
///
/// assert_eq!(column.column_type, ColumnType::Date);
/// assert!(column.sortable);
/// assert!(!column.searchable);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub value_from: Option<String>,
    pub display_from: Option<String>,
    pub relation: Option<String>,
    pub sql_select: Option<String>,
    pub sortable: bool,
    pub searchable: bool,
    pub invisible: bool,
    pub hidden: bool,
    pub clickable: bool,
    pub format: Option<String>,
    pub defaults: Option<String>,
    /// Partial used by the `partial` type.
    pub path: Option<String>,
    pub use_relation_count: bool,
    pub css_class: Option<String>,
    pub head_css_class: Option<String>,
    pub width: Option<String>,
    pub align: Option<String>,

    /// Every option the column was configured with, for type-specific lookups.
    #[serde(skip)]
    pub config: Map<String, JsonValue>,
}

impl ColumnDefinition {
    /// Creates a text column.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            column_type: ColumnType::Text,
            value_from: None,
            display_from: None,
            relation: None,
            sql_select: None,
            sortable: true,
            searchable: false,
            invisible: false,
            hidden: false,
            clickable: true,
            format: None,
            defaults: None,
            path: None,
            use_relation_count: false,
            css_class: None,
            head_css_class: None,
            width: None,
            align: None,
            config: Map::new(),
        }
    }

    /// Builds a column from its declarative configuration.
    ///
    /// Two name shorthands are recognised: `pivot[field]` binds the column to
    /// the pivot record, and any other `a[b]` name reads a nested value.
    pub fn from_config(
        name: impl Into<String>,
        config: ColumnConfig,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let label = config
            .label()
            .map(str::to_string)
            .unwrap_or_else(|| studly_case(&name));
        let mut options = config.into_options();

        if name.starts_with("pivot[") && name.contains(']') {
            let mut segments = name_to_array(&name).into_iter();
            let relation = segments.next().unwrap_or_default();
            let rest: Vec<String> = segments.collect();
            options.insert("relation".to_string(), JsonValue::String(relation));
            options.insert(
                "valueFrom".to_string(),
                JsonValue::String(array_to_name(&rest)),
            );
            options.insert("searchable".to_string(), JsonValue::Bool(false));
        } else if name.contains('[') && name.contains(']') {
            options.insert("valueFrom".to_string(), JsonValue::String(name.clone()));
            options.insert("sortable".to_string(), JsonValue::Bool(false));
            options.insert("searchable".to_string(), JsonValue::Bool(false));
        }

        let mut column = ColumnDefinition::new(name, label);
        column.apply_options(options)?;
        Ok(column)
    }

    fn apply_options(&mut self, options: Map<String, JsonValue>) -> Result<(), ConfigurationError> {
        if let Some(column_type) = self.read_str(&options, "type")? {
            self.column_type = ColumnType::parse(&column_type);
        }
        self.value_from = self.read_str(&options, "valueFrom")?.or(self.value_from.take());
        self.display_from = self.read_str(&options, "displayFrom")?;
        self.relation = self.read_str(&options, "relation")?;
        self.sql_select = match self.read_str(&options, "select")? {
            Some(select) => Some(select),
            None => self.read_str(&options, "sqlSelect")?,
        };
        self.sortable = self.read_bool(&options, "sortable")?.unwrap_or(self.sortable);
        self.searchable = self.read_bool(&options, "searchable")?.unwrap_or(self.searchable);
        self.invisible = self.read_bool(&options, "invisible")?.unwrap_or(self.invisible);
        self.hidden = self.read_bool(&options, "hidden")?.unwrap_or(self.hidden);
        self.clickable = self.read_bool(&options, "clickable")?.unwrap_or(self.clickable);
        self.use_relation_count = self
            .read_bool(&options, "useRelationCount")?
            .unwrap_or(self.use_relation_count);
        self.format = self.read_str(&options, "format")?;
        self.defaults = options
            .get("default")
            .filter(|value| !value.is_null())
            .map(|value| Value::from_json(value.clone()).to_text());
        self.path = self.read_str(&options, "path")?;
        self.css_class = self.read_str(&options, "cssClass")?;
        self.head_css_class = self.read_str(&options, "headCssClass")?;
        self.width = self.read_str(&options, "width")?;
        self.align = self.read_str(&options, "align")?;
        self.config = options;
        Ok(())
    }

    fn read_str(
        &self,
        options: &Map<String, JsonValue>,
        key: &str,
    ) -> Result<Option<String>, ConfigurationError> {
        match options.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(value)) => Ok(Some(value.clone())),
            Some(JsonValue::Number(value)) => Ok(Some(value.to_string())),
            Some(_) => Err(self.invalid(format!("option '{key}' must be a string"))),
        }
    }

    fn read_bool(
        &self,
        options: &Map<String, JsonValue>,
        key: &str,
    ) -> Result<Option<bool>, ConfigurationError> {
        match options.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(self.invalid(format!("option '{key}' must be a boolean"))),
        }
    }

    fn invalid(&self, message: String) -> ConfigurationError {
        ConfigurationError::InvalidColumn {
            column: self.name.clone(),
            message,
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Sets the display type.
    pub fn display_as(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    /// Binds the column to a relation.
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// Sets the value path.
    pub fn with_value_from(mut self, value_from: impl Into<String>) -> Self {
        self.value_from = Some(value_from.into());
        self
    }

    /// Sets the raw SQL select; `@` stands for the owning table.
    pub fn with_sql_select(mut self, select: impl Into<String>) -> Self {
        self.sql_select = Some(select.into());
        self
    }

    /// Sets the format string.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the fallback display value.
    pub fn with_default(mut self, defaults: impl Into<String>) -> Self {
        self.defaults = Some(defaults.into());
        self
    }

    /// Marks the column searchable.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Marks the column sortable.
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Hides the column by default.
    pub fn invisible(mut self, invisible: bool) -> Self {
        self.invisible = invisible;
        self
    }

    /// Sets a type-specific option.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns a type-specific option.
    pub fn get_config(&self, key: &str) -> Option<&JsonValue> {
        self.config.get(key)
    }

    /// Returns `true` if the column reads from the pivot record.
    pub fn is_pivot(&self) -> bool {
        self.relation.as_deref() == Some(PIVOT_RELATION)
    }

    /// Returns `true` if the value is the size of a relation.
    pub fn is_relation_count(&self) -> bool {
        self.use_relation_count && self.relation.is_some()
    }

    /// Path segments used to read the value.
    pub fn value_path(&self) -> Vec<String> {
        name_to_array(self.value_from.as_deref().unwrap_or(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_defaults_to_studly_name() {
        let column = ColumnDefinition::from_config("release_date", ColumnConfig::from(json!({})))
            .unwrap();
        assert_eq!(column.label, "ReleaseDate");
        assert_eq!(column.column_type, ColumnType::Text);
    }

    #[test]
    fn test_pivot_shorthand() {
        let column = ColumnDefinition::from_config("pivot[role][title]", "Role".into()).unwrap();
        assert!(column.is_pivot());
        assert_eq!(column.value_from.as_deref(), Some("role[title]"));
        assert!(!column.searchable);
        assert!(column.sortable);
    }

    #[test]
    fn test_nested_value_shorthand() {
        let column = ColumnDefinition::from_config(
            "meta[rating]",
            ColumnConfig::from(json!({ "searchable": true })),
        )
        .unwrap();
        assert_eq!(column.value_from.as_deref(), Some("meta[rating]"));
        assert_eq!(column.value_path(), vec!["meta", "rating"]);
        assert!(!column.sortable);
        assert!(!column.searchable);
    }

    #[test]
    fn test_typed_options() {
        let column = ColumnDefinition::from_config(
            "genres",
            ColumnConfig::from(json!({
                "label": "Genres",
                "relation": "genres",
                "select": "@title",
                "type": "Summary",
                "default": 0,
                "limitChars": 10
            })),
        )
        .unwrap();
        assert_eq!(column.sql_select.as_deref(), Some("@title"));
        assert_eq!(column.column_type, ColumnType::Summary);
        assert_eq!(column.defaults.as_deref(), Some("0"));
        assert_eq!(column.get_config("limitChars"), Some(&json!(10)));
    }

    #[test]
    fn test_invalid_option_type() {
        let err = ColumnDefinition::from_config(
            "title",
            ColumnConfig::from(json!({ "sortable": "yes" })),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidColumn { .. }));
    }

    #[test]
    fn test_custom_type_keeps_name() {
        assert_eq!(ColumnType::parse("rating"), ColumnType::Custom("rating".to_string()));
        assert_eq!(ColumnType::parse("TimeTense"), ColumnType::TimeTense);
    }
}
