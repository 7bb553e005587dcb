//! Cell value evaluation

use indexmap::IndexMap;
use log::trace;
use serde_json::Value as JsonValue;
use serde_json::json;

use super::ColumnTypeRegistry;
use super::DateTimeStyle;
use super::SummaryLimits;
use super::format_datetime;
use super::format_text;
use super::parse_datetime;
use super::summarize;
use crate::column::ColumnDefinition;
use crate::column::ColumnType;
use crate::error::ConfigurationError;
use crate::error::Error;
use crate::hooks::ExtensionHooks;
use crate::model::EntityDefinition;
use crate::model::Record;
use crate::model::RelationKind;
use crate::model::Value;
use crate::services::Services;
use crate::util::snake_case;

const DEFAULT_IMAGE_SIZE: u64 = 68;

/// Derives display values for list cells.
///
/// A cell passes through raw extraction, the column type transform, default
/// substitution and finally the value override hook.
///
/// # Example
///
/// ```
/// use gridlist_lib::column::ColumnDefinition;
/// use gridlist_lib::eval::ValueEvaluator;
/// use gridlist_lib::model::{EntityDefinition, Record};
/// use gridlist_lib::services::Services;
///
/// let entity = EntityDefinition::new("Movie", "movies");
/// let services = Services::default();
/// let evaluator = ValueEvaluator::new(&entity, &services);
///
/// let record = Record::new("Movie").set("title", "Heat & Dust");
/// let column = ColumnDefinition::new("title", "Title");
/// assert_eq!(
///     evaluator.value(&record, &column).unwrap().as_deref(),
///     Some("Heat &amp; Dust")
/// );
/// ```
pub struct ValueEvaluator<'a> {
    entity: &'a EntityDefinition,
    services: &'a Services,
    hooks: Option<&'a ExtensionHooks>,
    types: Option<&'a ColumnTypeRegistry>,
}

impl<'a> ValueEvaluator<'a> {
    pub fn new(entity: &'a EntityDefinition, services: &'a Services) -> Self {
        Self {
            entity,
            services,
            hooks: None,
            types: None,
        }
    }

    pub fn hooks(mut self, hooks: &'a ExtensionHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn types(mut self, types: &'a ColumnTypeRegistry) -> Self {
        self.types = Some(types);
        self
    }

    /// Translated column header, subject to the header override hook.
    pub fn header_value(&self, column: &ColumnDefinition) -> String {
        let value = self.services.translator.translate(&column.label);
        self.hooks
            .and_then(|hooks| hooks.override_header_value(column, &value))
            .unwrap_or(value)
    }

    // =========================================================================
    // Raw extraction
    // =========================================================================

    /// The untransformed value of `column` for `record`.
    pub fn raw_value(&self, record: &Record, column: &ColumnDefinition) -> Result<Value, Error> {
        let value = match (&column.value_from, &column.relation) {
            (Some(_), Some(relation)) => self.related_value(record, column, relation)?,
            (Some(_), None) => record.value_at(&column.value_path()),
            (None, _) => self.attribute_value(record, column),
        };

        Ok(self
            .hooks
            .and_then(|hooks| hooks.override_raw_value(record, column, &value))
            .unwrap_or(value))
    }

    fn related_value(
        &self,
        record: &Record,
        column: &ColumnDefinition,
        relation: &str,
    ) -> Result<Value, Error> {
        let Some(related) = record.relation(relation) else {
            return Ok(Value::Null);
        };
        let multi = match self.entity.relation(relation) {
            _ if column.is_pivot() => false,
            Some(definition) => definition.kind.is_multi(),
            None => matches!(related, Value::Records(_)),
        };

        let path = column.value_path();
        let value = match related {
            Value::Records(items) if multi => {
                Value::List(items.iter().map(|item| item.value_at(&path)).collect())
            }
            Value::Records(items) => items
                .first()
                .map(|item| item.value_at(&path))
                .unwrap_or_default(),
            Value::Record(item) => item.value_at(&path),
            _ => Value::Null,
        };
        Ok(value)
    }

    fn attribute_value(&self, record: &Record, column: &ColumnDefinition) -> Value {
        let name = column.name.as_str();
        if self.entity.has_relation(name)
            && let Some(value) = record.get(name)
        {
            return value.clone();
        }

        if column.is_relation_count()
            && let Some(relation) = &column.relation
        {
            let alias = format!("{}_count", snake_case(relation));
            return record.get(&alias).cloned().unwrap_or_default();
        }

        record.value_at(&[name.to_string()])
    }

    // =========================================================================
    // Display value
    // =========================================================================

    /// The display value of `column` for `record`.
    ///
    /// `None` means the cell is empty and the column has no default.
    pub fn value(&self, record: &Record, column: &ColumnDefinition) -> Result<Option<String>, Error> {
        let raw = match &column.display_from {
            Some(field) => record.get(field).cloned().unwrap_or_default(),
            None => self.raw_value(record, column)?,
        };

        let mut value = self.transform(record, column, &raw)?;
        if value.as_deref().is_none_or(str::is_empty) {
            value = column.defaults.clone();
        }

        if let Some(hooks) = self.hooks
            && let Some(replacement) = hooks.override_value(record, column, value.as_deref())
        {
            value = Some(replacement);
        }

        trace!("Evaluated column '{}' as {:?}", column.name, value);
        Ok(value)
    }

    /// Applies the column type transform to `value`.
    pub fn transform(
        &self,
        record: &Record,
        column: &ColumnDefinition,
        value: &Value,
    ) -> Result<Option<String>, Error> {
        let rendered = match &column.column_type {
            ColumnType::Text | ColumnType::Number => {
                Some(format_text(value, column.format.as_deref()))
            }
            ColumnType::Image => self.image(column, value),
            ColumnType::Switch => Some(self.switch(column, value)),
            ColumnType::Summary => Some(summarize(&value.to_text(), &summary_limits(column))),
            ColumnType::DateTime => self.datetime(column, value, DateTimeStyle::DateTime)?,
            ColumnType::Time => self.datetime(column, value, DateTimeStyle::Time)?,
            ColumnType::Date => self.datetime(column, value, DateTimeStyle::Date)?,
            ColumnType::TimeSince => self.datetime(column, value, DateTimeStyle::TimeSince)?,
            ColumnType::TimeTense => self.datetime(column, value, DateTimeStyle::TimeTense)?,
            ColumnType::Selectable => Some(self.selectable(record, column, value)?),
            ColumnType::Partial => Some(self.partial(record, column, value)?),
            ColumnType::ColorPicker => Some(
                self.services
                    .renderer
                    .render_partial("column_colorpicker", &json!({ "value": value.to_json() })),
            ),
            ColumnType::Custom(name) => {
                let provider = self
                    .types
                    .and_then(|types| types.get(name))
                    .ok_or_else(|| ConfigurationError::unknown_column_type(name.as_str()))?;
                Some(provider.evaluate(value, column, record)?)
            }
        };
        Ok(rendered)
    }

    // =========================================================================
    // Type transforms
    // =========================================================================

    fn image(&self, column: &ColumnDefinition, value: &Value) -> Option<String> {
        let attachment = matches!(
            self.entity.relation(&column.name).map(|relation| relation.kind),
            Some(RelationKind::AttachOne | RelationKind::AttachMany)
        );

        let source = match value {
            Value::Records(files) if attachment => files.first().and_then(file_path),
            Value::Record(file) if attachment => file_path(file),
            other => {
                let text = other.to_text();
                if text.is_empty() {
                    None
                } else if text.contains("://") {
                    Some(text)
                } else {
                    Some(self.services.images.media_url(&text))
                }
            }
        };
        let Some(source) = source.filter(|source| !source.is_empty()) else {
            return Some(String::new());
        };

        let width = column.get_config("width").cloned();
        let height = column.get_config("height").cloned();
        let is_default_size = width.is_none() && height.is_none();
        let width = width.unwrap_or_else(|| json!(DEFAULT_IMAGE_SIZE));
        let height = height.unwrap_or_else(|| json!(DEFAULT_IMAGE_SIZE));
        let options = column
            .get_config("options")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let image_url = self.services.images.resize(&source, &width, &height, &options);
        Some(self.services.renderer.render_partial(
            "column_image",
            &json!({
                "imageUrl": image_url,
                "isDefaultSize": is_default_size,
                "width": width,
                "height": height,
            }),
        ))
    }

    fn switch(&self, column: &ColumnDefinition, value: &Value) -> String {
        let (index, fallback) = if value.is_truthy() {
            (1, "backend::lang.list.column_switch_true")
        } else {
            (0, "backend::lang.list.column_switch_false")
        };
        let key = column
            .get_config("options")
            .and_then(|options| options.get(index))
            .and_then(JsonValue::as_str)
            .unwrap_or(fallback);
        self.services.translator.translate(key)
    }

    fn datetime(
        &self,
        column: &ColumnDefinition,
        value: &Value,
        style: DateTimeStyle,
    ) -> Result<Option<String>, Error> {
        let now = self.services.clock.now();
        let Some(dt) = parse_datetime(value, &column.name, now)? else {
            return Ok(None);
        };

        let timezone = use_timezone(column, style.uses_timezone_by_default())
            .then_some(self.services.timezone);
        Ok(Some(format_datetime(
            dt,
            style,
            column.format.as_deref(),
            timezone,
            now,
        )))
    }

    fn selectable(
        &self,
        record: &Record,
        column: &ColumnDefinition,
        value: &Value,
    ) -> Result<String, Error> {
        let configured = column.get_config("options");
        let options = match configured.and_then(static_options) {
            Some(options) => options,
            None => {
                let entity = match column.relation.as_deref() {
                    Some(relation) if !column.is_pivot() => {
                        self.entity.require_relation(relation)?.entity.as_str()
                    }
                    _ => self.entity.name.as_str(),
                };
                let method = configured.and_then(JsonValue::as_str);
                self.services
                    .options
                    .as_ref()
                    .and_then(|provider| provider.options(entity, method, column, record))
                    .ok_or_else(|| ConfigurationError::MissingOptions {
                        column: column.name.clone(),
                    })?
            }
        };

        Ok(self.services.renderer.render_partial(
            "column_selectable",
            &json!({
                "fieldOptions": options,
                "value": value.to_json(),
            }),
        ))
    }

    fn partial(
        &self,
        record: &Record,
        column: &ColumnDefinition,
        value: &Value,
    ) -> Result<String, Error> {
        let name = column.path.as_deref().unwrap_or(&column.name);
        let column = serde_json::to_value(column)?;
        let record = serde_json::to_value(record)?;
        let value = value.to_json();
        Ok(self.services.renderer.render_partial(
            name,
            &json!({
                "listColumn": column,
                "listRecord": record,
                "listValue": value,
                "column": column,
                "record": record,
                "value": value,
            }),
        ))
    }
}

fn file_path(file: &Record) -> Option<String> {
    file.get("path").map(Value::to_text)
}

fn use_timezone(column: &ColumnDefinition, default: bool) -> bool {
    if column
        .get_config("ignoreTimezone")
        .is_some_and(|ignore| Value::from_json(ignore.clone()).is_truthy())
    {
        return false;
    }
    column
        .get_config("useTimezone")
        .and_then(JsonValue::as_bool)
        .unwrap_or(default)
}

fn summary_limits(column: &ColumnDefinition) -> SummaryLimits {
    let defaults = SummaryLimits::default();
    let number = |key| {
        column
            .get_config(key)
            .and_then(JsonValue::as_u64)
            .map(|n| n as usize)
    };
    SummaryLimits {
        limit_chars: number("limitChars").unwrap_or(defaults.limit_chars),
        limit_words: number("limitWords").filter(|words| *words > 0),
        end_chars: column
            .get_config("endChars")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or(defaults.end_chars),
    }
}

fn static_options(options: &JsonValue) -> Option<IndexMap<String, String>> {
    let text = |value: &JsonValue| Value::from_json(value.clone()).to_text();
    match options {
        JsonValue::Object(map) => Some(map.iter().map(|(key, value)| (key.clone(), text(value))).collect()),
        JsonValue::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), text(value)))
                .collect(),
        ),
        _ => None,
    }
}
