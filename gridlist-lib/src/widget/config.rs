//! Declarative list configuration

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::column::ColumnConfig;
use crate::query::Direction;

/// Whether pagination is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowPagination {
    /// Shown when a positive page size is configured.
    #[default]
    Auto,
    Always,
    Never,
}

impl ShowPagination {
    /// Resolves the setting against the effective page size.
    pub fn resolve(self, records_per_page: Option<usize>) -> bool {
        match self {
            ShowPagination::Auto => records_per_page.is_some_and(|per_page| per_page > 0),
            ShowPagination::Always => true,
            ShowPagination::Never => false,
        }
    }
}

impl Serialize for ShowPagination {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ShowPagination::Auto => serializer.serialize_str("auto"),
            ShowPagination::Always => serializer.serialize_bool(true),
            ShowPagination::Never => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for ShowPagination {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Word(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Ok(ShowPagination::Always),
            Raw::Flag(false) => Ok(ShowPagination::Never),
            Raw::Word(word) if word.eq_ignore_ascii_case("auto") => Ok(ShowPagination::Auto),
            Raw::Word(word) => Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(&word),
                &"true, false or \"auto\"",
            )),
        }
    }
}

/// The configured default sort: a bare column name sorts descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultSort {
    Column(String),
    Explicit {
        column: String,
        #[serde(default = "descending")]
        direction: Direction,
    },
}

fn descending() -> Direction {
    Direction::Desc
}

impl DefaultSort {
    pub fn column(&self) -> &str {
        match self {
            DefaultSort::Column(column) => column,
            DefaultSort::Explicit { column, .. } => column,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            DefaultSort::Column(_) => Direction::Desc,
            DefaultSort::Explicit { direction, .. } => *direction,
        }
    }
}

/// Configuration of a list widget.
///
/// # Example
///
/// ```
/// use gridlist_lib::widget::{ListConfig, ShowPagination};
///
/// let config: ListConfig = serde_json::from_str(r#"{
///     "columns": { "title": "Title", "year": { "type": "number" } },
///     "recordUrl": "movies/update/:id",
///     "recordsPerPage": 20,
///     "showPagination": "auto",
///     "defaultSort": { "column": "year", "direction": "asc" }
/// }"#).unwrap();
///
/// assert_eq!(config.columns.len(), 2);
/// assert_eq!(config.show_pagination, ShowPagination::Auto);
/// assert!(config.show_sorting);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListConfig {
    pub columns: IndexMap<String, ColumnConfig>,
    pub record_url: Option<String>,
    pub record_on_click: Option<String>,
    pub no_records_message: String,
    pub records_per_page: Option<usize>,
    pub per_page_options: Option<Vec<usize>>,
    pub show_sorting: bool,
    pub default_sort: Option<DefaultSort>,
    pub show_checkboxes: bool,
    pub show_setup: bool,
    pub show_pagination: ShowPagination,
    pub show_page_numbers: bool,
    pub custom_view_path: Option<String>,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            columns: IndexMap::new(),
            record_url: None,
            record_on_click: None,
            no_records_message: "backend::lang.list.no_records".to_string(),
            records_per_page: None,
            per_page_options: None,
            show_sorting: true,
            default_sort: None,
            show_checkboxes: false,
            show_setup: false,
            show_pagination: ShowPagination::Auto,
            show_page_numbers: true,
            custom_view_path: None,
        }
    }
}

impl ListConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column entry.
    pub fn with_column(mut self, name: impl Into<String>, config: impl Into<ColumnConfig>) -> Self {
        self.columns.insert(name.into(), config.into());
        self
    }

    pub fn with_record_url(mut self, url: impl Into<String>) -> Self {
        self.record_url = Some(url.into());
        self
    }

    pub fn with_record_on_click(mut self, onclick: impl Into<String>) -> Self {
        self.record_on_click = Some(onclick.into());
        self
    }

    pub fn with_no_records_message(mut self, message: impl Into<String>) -> Self {
        self.no_records_message = message.into();
        self
    }

    pub fn with_records_per_page(mut self, per_page: usize) -> Self {
        self.records_per_page = Some(per_page);
        self
    }

    pub fn with_per_page_options(mut self, options: impl Into<Vec<usize>>) -> Self {
        self.per_page_options = Some(options.into());
        self
    }

    pub fn with_sorting(mut self, show: bool) -> Self {
        self.show_sorting = show;
        self
    }

    pub fn with_default_sort(mut self, sort: DefaultSort) -> Self {
        self.default_sort = Some(sort);
        self
    }

    pub fn with_checkboxes(mut self, show: bool) -> Self {
        self.show_checkboxes = show;
        self
    }

    pub fn with_setup(mut self, show: bool) -> Self {
        self.show_setup = show;
        self
    }

    pub fn with_pagination(mut self, show: ShowPagination) -> Self {
        self.show_pagination = show;
        self
    }

    pub fn with_page_numbers(mut self, show: bool) -> Self {
        self.show_page_numbers = show;
        self
    }

    pub fn with_custom_view_path(mut self, path: impl Into<String>) -> Self {
        self.custom_view_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_pagination_forms() {
        let parse = |json| serde_json::from_str::<ShowPagination>(json).unwrap();
        assert_eq!(parse("true"), ShowPagination::Always);
        assert_eq!(parse("false"), ShowPagination::Never);
        assert_eq!(parse("\"auto\""), ShowPagination::Auto);
        assert!(serde_json::from_str::<ShowPagination>("\"sometimes\"").is_err());

        assert!(ShowPagination::Auto.resolve(Some(20)));
        assert!(!ShowPagination::Auto.resolve(Some(0)));
        assert!(!ShowPagination::Auto.resolve(None));
    }

    #[test]
    fn test_default_sort_forms() {
        let bare: DefaultSort = serde_json::from_str("\"year\"").unwrap();
        assert_eq!(bare.column(), "year");
        assert_eq!(bare.direction(), Direction::Desc);

        let explicit: DefaultSort =
            serde_json::from_str(r#"{ "column": "title", "direction": "asc" }"#).unwrap();
        assert_eq!(explicit.direction(), Direction::Asc);

        let implied: DefaultSort = serde_json::from_str(r#"{ "column": "title" }"#).unwrap();
        assert_eq!(implied.direction(), Direction::Desc);
    }

    #[test]
    fn test_defaults() {
        let config: ListConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ListConfig::default());
        assert_eq!(config.no_records_message, "backend::lang.list.no_records");
        assert!(config.show_page_numbers);
    }
}
