//! Extension hook points
//!
//! Each hook point holds an ordered list of callbacks. Mutating hooks all
//! run in registration order. Hooks that return a value run in registration
//! order until one returns a non-empty response, which is then used in place
//! of the original and ends the dispatch.

use crate::column::ColumnDefinition;
use crate::column::ColumnRegistry;
use crate::model::Record;
use crate::model::Value;
use crate::query::ListQuery;
use crate::services::AccessControl;

pub type BeforeQueryHook = Box<dyn Fn(&mut ListQuery)>;
pub type AfterQueryHook = Box<dyn Fn(&mut ListQuery) -> Option<ListQuery>>;
pub type RecordsHook = Box<dyn Fn(&mut Vec<Record>) -> Option<Vec<Record>>>;
pub type ColumnsHook = Box<dyn Fn(&mut ColumnRegistry, &dyn AccessControl)>;
pub type RecordActionHook =
    Box<dyn Fn(&Record, Option<&str>, Option<&str>) -> Option<RecordActionOverride>>;
pub type HeaderValueHook = Box<dyn Fn(&ColumnDefinition, &str) -> Option<String>>;
pub type RawValueHook = Box<dyn Fn(&Record, &ColumnDefinition, &Value) -> Option<Value>>;
pub type ValueHook = Box<dyn Fn(&Record, &ColumnDefinition, Option<&str>) -> Option<String>>;
pub type RowClassHook = Box<dyn Fn(&Record, &str) -> Option<String>>;

/// Replacement for a row's click action.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordActionOverride {
    /// A bare URL, prefixed with the backend URI.
    Url(String),
    /// Individual overrides; `None` leaves that part unchanged.
    Action {
        /// `Some(None)` removes the URL (it becomes `javascript:;`).
        url: Option<Option<String>>,
        /// `Some(None)` removes the click handler.
        onclick: Option<Option<String>>,
        /// `Some(false)` makes the row not clickable at all.
        clickable: Option<bool>,
    },
}

/// A hook response that may count as "no response".
trait Response {
    fn is_empty_response(&self) -> bool;
}

impl Response for String {
    fn is_empty_response(&self) -> bool {
        self.is_empty()
    }
}

impl Response for Value {
    fn is_empty_response(&self) -> bool {
        self.is_null()
    }
}

impl Response for Vec<Record> {
    fn is_empty_response(&self) -> bool {
        self.is_empty()
    }
}

impl Response for ListQuery {
    fn is_empty_response(&self) -> bool {
        false
    }
}

impl Response for RecordActionOverride {
    fn is_empty_response(&self) -> bool {
        match self {
            RecordActionOverride::Url(url) => url.is_empty(),
            RecordActionOverride::Action {
                url,
                onclick,
                clickable,
            } => url.is_none() && onclick.is_none() && clickable.is_none(),
        }
    }
}

fn first_response<T: Response>(responses: impl Iterator<Item = Option<T>>) -> Option<T> {
    responses
        .flatten()
        .find(|response| !response.is_empty_response())
}

/// Registered callbacks for every hook point of a list.
///
/// # Example
///
/// ```
/// use gridlist_lib::hooks::ExtensionHooks;
///
/// let mut hooks = ExtensionHooks::new();
/// hooks.on_inject_row_class(|record, _| {
///     record.get("archived").filter(|v| v.is_truthy()).map(|_| "archived".to_string())
/// });
/// assert_eq!(hooks.len(), 1);
/// ```
#[derive(Default)]
pub struct ExtensionHooks {
    before_query_build: Vec<BeforeQueryHook>,
    after_query_build: Vec<AfterQueryHook>,
    after_records_fetch: Vec<RecordsHook>,
    extend_columns: Vec<ColumnsHook>,
    override_record_action: Vec<RecordActionHook>,
    override_header_value: Vec<HeaderValueHook>,
    override_raw_value: Vec<RawValueHook>,
    override_value: Vec<ValueHook>,
    inject_row_class: Vec<RowClassHook>,
}

impl std::fmt::Debug for ExtensionHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionHooks")
            .field("registered", &self.len())
            .finish()
    }
}

impl ExtensionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of registered callbacks.
    pub fn len(&self) -> usize {
        self.before_query_build.len()
            + self.after_query_build.len()
            + self.after_records_fetch.len()
            + self.extend_columns.len()
            + self.override_record_action.len()
            + self.override_header_value.len()
            + self.override_raw_value.len()
            + self.override_value.len()
            + self.inject_row_class.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Called with the base query before the list applies its own scopes.
    pub fn on_before_query_build(&mut self, hook: impl Fn(&mut ListQuery) + 'static) {
        self.before_query_build.push(Box::new(hook));
    }

    /// Called with the finished query; a returned query replaces it.
    pub fn on_after_query_build(
        &mut self,
        hook: impl Fn(&mut ListQuery) -> Option<ListQuery> + 'static,
    ) {
        self.after_query_build.push(Box::new(hook));
    }

    /// Called with the fetched rows; a returned set replaces them.
    pub fn on_after_records_fetch(
        &mut self,
        hook: impl Fn(&mut Vec<Record>) -> Option<Vec<Record>> + 'static,
    ) {
        self.after_records_fetch.push(Box::new(hook));
    }

    /// Called with the declared columns, to add or remove columns.
    pub fn on_extend_columns(
        &mut self,
        hook: impl Fn(&mut ColumnRegistry, &dyn AccessControl) + 'static,
    ) {
        self.extend_columns.push(Box::new(hook));
    }

    /// Called with a record, its URL and click handler.
    pub fn on_override_record_action(
        &mut self,
        hook: impl Fn(&Record, Option<&str>, Option<&str>) -> Option<RecordActionOverride> + 'static,
    ) {
        self.override_record_action.push(Box::new(hook));
    }

    /// Called with a column and its translated label.
    pub fn on_override_header_value(
        &mut self,
        hook: impl Fn(&ColumnDefinition, &str) -> Option<String> + 'static,
    ) {
        self.override_header_value.push(Box::new(hook));
    }

    /// Called with a record, a column and its raw value.
    pub fn on_override_raw_value(
        &mut self,
        hook: impl Fn(&Record, &ColumnDefinition, &Value) -> Option<Value> + 'static,
    ) {
        self.override_raw_value.push(Box::new(hook));
    }

    /// Called with a record, a column and its display value.
    pub fn on_override_value(
        &mut self,
        hook: impl Fn(&Record, &ColumnDefinition, Option<&str>) -> Option<String> + 'static,
    ) {
        self.override_value.push(Box::new(hook));
    }

    /// Called with a record and its current row class.
    pub fn on_inject_row_class(&mut self, hook: impl Fn(&Record, &str) -> Option<String> + 'static) {
        self.inject_row_class.push(Box::new(hook));
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub fn before_query_build(&self, query: &mut ListQuery) {
        for hook in &self.before_query_build {
            hook(query);
        }
    }

    pub fn after_query_build(&self, query: &mut ListQuery) -> Option<ListQuery> {
        first_response(self.after_query_build.iter().map(|hook| hook(query)))
    }

    pub fn after_records_fetch(&self, records: &mut Vec<Record>) -> Option<Vec<Record>> {
        first_response(self.after_records_fetch.iter().map(|hook| hook(records)))
    }

    pub fn extend_columns(&self, columns: &mut ColumnRegistry, access: &dyn AccessControl) {
        for hook in &self.extend_columns {
            hook(columns, access);
        }
    }

    pub fn override_record_action(
        &self,
        record: &Record,
        url: Option<&str>,
        onclick: Option<&str>,
    ) -> Option<RecordActionOverride> {
        first_response(
            self.override_record_action
                .iter()
                .map(|hook| hook(record, url, onclick)),
        )
    }

    pub fn override_header_value(&self, column: &ColumnDefinition, value: &str) -> Option<String> {
        first_response(
            self.override_header_value
                .iter()
                .map(|hook| hook(column, value)),
        )
    }

    pub fn override_raw_value(
        &self,
        record: &Record,
        column: &ColumnDefinition,
        value: &Value,
    ) -> Option<Value> {
        first_response(
            self.override_raw_value
                .iter()
                .map(|hook| hook(record, column, value)),
        )
    }

    pub fn override_value(
        &self,
        record: &Record,
        column: &ColumnDefinition,
        value: Option<&str>,
    ) -> Option<String> {
        first_response(
            self.override_value
                .iter()
                .map(|hook| hook(record, column, value)),
        )
    }

    pub fn inject_row_class(&self, record: &Record, value: &str) -> Option<String> {
        first_response(self.inject_row_class.iter().map(|hook| hook(record, value)))
    }
}
