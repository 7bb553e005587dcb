//! Structured payloads returned by list actions

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::model::Value;
use crate::query::Direction;

/// A column header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub name: String,
    /// Translated header text.
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub sortable: bool,
    /// Sort direction when the list is sorted by this column.
    pub sorted: Option<Direction>,
    pub css_class: Option<String>,
    pub head_css_class: Option<String>,
    pub width: Option<String>,
    pub align: Option<String>,
}

/// A rendered cell; `None` is an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView {
    pub column: String,
    pub value: Option<String>,
    /// Whether the record action applies to this cell.
    pub clickable: bool,
}

/// The click action of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordAction {
    pub url: Option<String>,
    /// Rendered `onclick="..."` attribute.
    pub onclick: Option<String>,
}

/// A rendered row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub key: Option<Value>,
    pub css_class: String,
    pub checked: bool,
    pub action: Option<RecordAction>,
    pub cells: Vec<CellView>,
}

/// Pagination metrics for the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationView {
    pub page_current: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_last: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_from: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_to: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more_pages: Option<bool>,
}

/// Everything needed to draw the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub id: String,
    pub css_classes: String,
    pub columns: Vec<ColumnView>,
    pub column_total: usize,
    pub rows: Vec<RowView>,
    pub no_records_message: String,
    pub show_checkboxes: bool,
    pub show_setup: bool,
    pub show_pagination: bool,
    pub show_page_numbers: bool,
    pub show_sorting: bool,
    pub sort_column: Option<String>,
    pub sort_direction: Direction,
    pub pagination: PaginationView,
    /// JSON array of checked row keys, or empty if it could not be encoded.
    pub checked_rows: String,
}

/// A column entry in the setup form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupColumnView {
    pub name: String,
    pub label: String,
    pub invisible: bool,
}

/// The list setup form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupView {
    pub title: String,
    pub columns: Vec<SetupColumnView>,
    pub per_page_options: Vec<usize>,
    pub records_per_page: Option<usize>,
}

/// What an action rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionPayload {
    List(Box<ListView>),
    Setup(SetupView),
}

/// The result of a list action, keyed by its target element.
///
/// Serializes as `{ "#<id>": payload }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    pub target: String,
    pub payload: ActionPayload,
}

impl ActionResponse {
    pub fn list(view: ListView) -> Self {
        Self {
            target: format!("#{}", view.id),
            payload: ActionPayload::List(Box::new(view)),
        }
    }

    pub fn setup(id: &str, view: SetupView) -> Self {
        Self {
            target: format!("#{id}"),
            payload: ActionPayload::Setup(view),
        }
    }

    /// The list view, if this response carries one.
    pub fn list_view(&self) -> Option<&ListView> {
        match &self.payload {
            ActionPayload::List(view) => Some(view),
            ActionPayload::Setup(_) => None,
        }
    }

    /// The setup view, if this response carries one.
    pub fn setup_view(&self) -> Option<&SetupView> {
        match &self.payload {
            ActionPayload::Setup(view) => Some(view),
            ActionPayload::List(_) => None,
        }
    }
}

impl Serialize for ActionResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.target, &self.payload)?;
        map.end()
    }
}
