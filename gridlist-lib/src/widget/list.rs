//! The list widget

use std::sync::Arc;
use std::sync::LazyLock;

use indexmap::IndexSet;
use log::debug;
use log::warn;
use regex::Captures;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use super::ListConfig;
use super::ListWidgetBuilder;
use super::Missing;
use super::RecordAction;
use crate::column::ColumnDefinition;
use crate::column::ColumnRegistry;
use crate::error::Error;
use crate::eval::ColumnTypeRegistry;
use crate::eval::ValueEvaluator;
use crate::eval::escape_html;
use crate::executor::QueryExecutor;
use crate::hooks::ExtensionHooks;
use crate::hooks::RecordActionOverride;
use crate::model::EntityDefinition;
use crate::model::Record;
use crate::model::Value;
use crate::pagination::PageSettings;
use crate::pagination::Paginator;
use crate::pagination::RecordPage;
use crate::query::Direction;
use crate::query::Field;
use crate::query::Filter;
use crate::query::FilterCallback;
use crate::query::ListQuery;
use crate::query::QueryBuilder;
use crate::query::SearchMode;
use crate::query::SearchScopes;
use crate::query::SearchState;
use crate::services::Services;
use crate::storage::PREF_ORDER;
use crate::storage::PREF_SORT;
use crate::storage::PREF_VISIBLE;
use crate::storage::PreferenceStore;
use crate::storage::SessionStore;

const NO_ACTION_URL: &str = "javascript:;";

static URL_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\w+)").expect("Invalid parameter pattern"));

/// A persisted sort choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortPreference {
    pub column: String,
    pub direction: Direction,
}

/// Column snapshots for one render pass.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    /// Every column after purging and reordering.
    pub all: ColumnRegistry,
    /// The columns shown, in display order.
    pub visible: ColumnRegistry,
}

/// A list widget bound to one entity.
///
/// The widget owns the request-scoped state of a list (page, sort, search,
/// filters and checked rows) and drives the pipeline from column resolution
/// through query building and pagination to cell evaluation.
pub struct ListWidget {
    pub(super) id: String,
    pub(super) entity: Arc<EntityDefinition>,
    pub(super) config: ListConfig,
    pub(super) executor: Box<dyn QueryExecutor>,
    pub(super) services: Services,
    pub(super) hooks: ExtensionHooks,
    pub(super) types: ColumnTypeRegistry,
    pub(super) scopes: SearchScopes,
    pub(super) preferences: Option<PreferenceStore>,
    pub(super) session: Option<SessionStore>,

    /// Columns defined in code, before configured columns are added.
    pub(super) columns: ColumnRegistry,
    pub(super) resolved: Option<Arc<ResolvedColumns>>,
    pub(super) column_override: Option<Vec<String>>,

    pub(super) records_per_page: Option<usize>,
    pub(super) show_pagination: bool,
    pub(super) current_page: Option<usize>,
    pub(super) search: SearchState,
    pub(super) filters: Vec<FilterCallback>,
    pub(super) sort_column: Option<String>,
    pub(super) sort_direction: Option<Direction>,
    pub(super) checked: Vec<String>,
    pub(super) css_classes: Vec<String>,
}

impl std::fmt::Debug for ListWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListWidget")
            .field("id", &self.id)
            .field("entity", &self.entity.name)
            .field("records_per_page", &self.records_per_page)
            .field("current_page", &self.current_page)
            .field("sort_column", &self.sort_column)
            .field("sort_direction", &self.sort_direction)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl ListWidget {
    /// Creates a new builder for a widget with the given id.
    pub fn builder(id: impl Into<String>) -> ListWidgetBuilder<Missing> {
        ListWidgetBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entity(&self) -> &EntityDefinition {
        &self.entity
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Mutable access to the hooks, for registering extensions.
    pub fn hooks_mut(&mut self) -> &mut ExtensionHooks {
        self.resolved = None;
        &mut self.hooks
    }

    pub fn records_per_page(&self) -> Option<usize> {
        self.records_per_page
    }

    pub fn show_pagination(&self) -> bool {
        self.show_pagination
    }

    /// Adds a CSS class to the list container.
    pub fn add_css_class(&mut self, class: impl Into<String>) {
        self.css_classes.push(class.into());
    }

    /// The container CSS classes, space separated.
    pub fn css_classes(&self) -> String {
        self.css_classes.join(" ")
    }

    /// The translated empty list message.
    pub fn no_records_message(&self) -> String {
        self.services
            .translator
            .translate(&self.config.no_records_message)
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Defines a column in code, replacing any column of the same name.
    pub fn define_column(
        &mut self,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> &mut ColumnDefinition {
        self.resolved = None;
        self.columns.define_column(name, label)
    }

    /// Adds columns from configuration entries, skipping those the user may not see.
    pub fn add_columns<I, K>(&mut self, columns: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, crate::column::ColumnConfig)>,
        K: Into<String>,
    {
        self.resolved = None;
        self.columns
            .add_columns(columns, self.services.access.as_ref())
            .map_err(Error::from)
    }

    /// Removes a column defined in code or configuration.
    pub fn remove_column(&mut self, name: &str) {
        self.resolved = None;
        self.columns.remove_column(name);
        self.config.columns.shift_remove(name);
    }

    /// Resolves the column snapshots, caching them until the columns change.
    pub fn resolve_columns(&mut self) -> Result<Arc<ResolvedColumns>, Error> {
        if let Some(resolved) = &self.resolved {
            return Ok(Arc::clone(resolved));
        }

        let access = self.services.access.as_ref();
        let mut declared =
            ColumnRegistry::declare(&self.columns, &self.entity, &self.config.columns, access)?;
        self.hooks.extend_columns(&mut declared, access);

        let purged = declared.purged();
        let order: Vec<String> = self.preference(PREF_ORDER)?.unwrap_or_default();
        let all = purged.reordered(&order);

        if self.config.show_setup && self.column_override.is_none() {
            self.column_override = self.preference(PREF_VISIBLE)?;
        }
        let visible = all.visible(self.column_override.as_deref());

        debug!(
            "Resolved {} columns for list '{}' ({} visible)",
            all.len(),
            self.id,
            visible.len()
        );

        let resolved = Arc::new(ResolvedColumns { all, visible });
        self.resolved = Some(Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Every column after purging and reordering.
    pub fn columns(&mut self) -> Result<ColumnRegistry, Error> {
        Ok(self.resolve_columns()?.all.clone())
    }

    /// The columns shown, in display order.
    pub fn visible_columns(&mut self) -> Result<ColumnRegistry, Error> {
        Ok(self.resolve_columns()?.visible.clone())
    }

    /// Looks up a column by name.
    pub fn column(&mut self, name: &str) -> Result<ColumnDefinition, Error> {
        Ok(self.resolve_columns()?.all.column(name)?.clone())
    }

    pub fn is_column_visible(&mut self, name: &str) -> Result<bool, Error> {
        Ok(self.resolve_columns()?.visible.contains(name))
    }

    /// Visible columns plus the checkbox and setup columns.
    pub fn total_columns(&mut self) -> Result<usize, Error> {
        let mut total = self.resolve_columns()?.visible.len();
        if self.config.show_checkboxes {
            total += 1;
        }
        if self.config.show_setup {
            total += 1;
        }
        Ok(total)
    }

    /// Overrides the visible columns for this request.
    pub fn set_visible_columns(&mut self, columns: Vec<String>) {
        self.resolved = None;
        self.column_override = Some(columns);
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Sets the sort for this request.
    pub fn set_sort(&mut self, column: impl Into<String>, direction: Direction) {
        self.sort_column = Some(column.into());
        self.sort_direction = Some(direction);
    }

    /// Resolves the sort column.
    ///
    /// An explicit sort wins, then the stored preference when sorting is
    /// shown, then the configured default. A missing or unsortable choice
    /// falls back to the first sortable visible column, descending. `None`
    /// when no column is sortable.
    pub fn sort_column(&mut self) -> Result<Option<String>, Error> {
        let resolved = self.resolve_columns()?;
        let sortable = |name: &str| resolved.all.get(name).is_some_and(|column| column.sortable);
        if !resolved.all.iter().any(|column| column.sortable) {
            return Ok(None);
        }

        if self.sort_column.is_some() {
            return Ok(self.sort_column.clone());
        }

        let stored = if self.config.show_sorting {
            self.preference::<SortPreference>(PREF_SORT)?
        } else {
            None
        };
        if let Some(stored) = stored {
            self.sort_column = Some(stored.column);
            self.sort_direction = Some(stored.direction);
        } else if let Some(default) = &self.config.default_sort {
            self.sort_column = Some(default.column().to_string());
            self.sort_direction = Some(default.direction());
        }

        if self.sort_column.as_deref().is_none_or(|name| !sortable(name)) {
            self.sort_column = resolved
                .visible
                .iter()
                .find(|column| column.sortable)
                .map(|column| column.name.clone());
            self.sort_direction = Some(Direction::Desc);
        }

        Ok(self.sort_column.clone())
    }

    /// The sort direction, ascending when unset.
    pub fn sort_direction(&self) -> Direction {
        self.sort_direction.unwrap_or_default()
    }

    /// Applies the sort toggle for `column`: a new column, or one sorted
    /// ascending, sorts descending; otherwise ascending.
    pub fn toggle_sort(&mut self, column: &str) -> Result<SortPreference, Error> {
        let current = self.sort_column()?;
        let direction =
            if current.as_deref() != Some(column) || self.sort_direction == Some(Direction::Asc) {
                Direction::Desc
            } else {
                Direction::Asc
            };

        self.set_sort(column, direction);
        Ok(SortPreference {
            column: column.to_string(),
            direction,
        })
    }

    // =========================================================================
    // Search and filters
    // =========================================================================

    /// Applies a search term, optionally returning to the first page.
    pub fn set_search_term(&mut self, term: impl Into<String>, reset_pagination: bool) {
        if reset_pagination {
            self.current_page = Some(1);
        }
        self.search.term = Some(term.into());
    }

    /// Sets the search mode and named scope. `None` restores the defaults.
    pub fn set_search_options(&mut self, mode: Option<SearchMode>, scope: Option<String>) {
        self.search.mode = mode.unwrap_or_default();
        self.search.scope = scope;
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// Registers a named search scope.
    pub fn register_search_scope(
        &mut self,
        name: impl Into<String>,
        scope: impl Fn(&str, &[Field]) -> Filter + Send + Sync + 'static,
    ) {
        self.scopes.register(name, Arc::new(scope));
    }

    /// Adds a query callback, applied in registration order.
    pub fn add_filter(&mut self, filter: impl Fn(&mut ListQuery) + 'static) {
        self.filters.push(Box::new(filter));
    }

    // =========================================================================
    // Query and records
    // =========================================================================

    /// Sets the requested page number.
    pub fn set_page(&mut self, page: Option<usize>) {
        self.current_page = page;
    }

    /// Sets the checked row keys from the request, dropping duplicates.
    pub fn set_checked_rows<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: IndexSet<String> = keys.into_iter().map(Into::into).collect();
        self.checked = unique.into_iter().collect();
    }

    /// Builds the list query without running it.
    pub fn prepare_query(&mut self) -> Result<ListQuery, Error> {
        let resolved = self.resolve_columns()?;
        let sort_column = self.sort_column()?;
        let direction = self.sort_direction();

        let mut builder = QueryBuilder::new(&self.entity, &resolved.all, &resolved.visible)
            .search(&self.search, &self.scopes)
            .filters(&self.filters)
            .hooks(&self.hooks);
        if let Some(column) = sort_column.as_deref() {
            builder = builder.sort(column, direction);
        }

        Ok(builder.build()?)
    }

    /// Runs the list query for the current page.
    pub fn records(&mut self) -> Result<RecordPage, Error> {
        let query = self.prepare_query()?;
        let settings = PageSettings {
            per_page: self.records_per_page,
            show_pagination: self.show_pagination,
            show_page_numbers: self.config.show_page_numbers,
        };

        let mut paginator = Paginator::new(self.executor.as_ref()).hooks(&self.hooks);
        if let Some(session) = &self.session {
            paginator = paginator.session(session);
        }
        paginator.fetch(&query, self.current_page, settings)
    }

    // =========================================================================
    // Cells and rows
    // =========================================================================

    /// A value evaluator bound to this list.
    pub fn evaluator(&self) -> ValueEvaluator<'_> {
        ValueEvaluator::new(&self.entity, &self.services)
            .hooks(&self.hooks)
            .types(&self.types)
    }

    pub fn header_value(&self, column: &ColumnDefinition) -> String {
        self.evaluator().header_value(column)
    }

    pub fn column_value_raw(&self, record: &Record, column: &ColumnDefinition) -> Result<Value, Error> {
        self.evaluator().raw_value(record, column)
    }

    pub fn column_value(
        &self,
        record: &Record,
        column: &ColumnDefinition,
    ) -> Result<Option<String>, Error> {
        self.evaluator().value(record, column)
    }

    /// Returns `true` if rows have a click action.
    pub fn has_record_action(&self) -> bool {
        self.config.record_url.is_some() || self.config.record_on_click.is_some()
    }

    /// The URL a row links to.
    pub fn record_url(&self, record: &Record) -> Option<String> {
        if self.config.record_on_click.is_some() {
            return Some(NO_ACTION_URL.to_string());
        }
        let template = self.config.record_url.as_deref()?;
        Some(self.services.backend_url(&replace_parameters(template, record)))
    }

    /// The rendered `onclick` attribute of a row.
    pub fn record_on_click(&self, record: &Record) -> Option<String> {
        let template = self.config.record_on_click.as_deref()?;
        Some(onclick_attribute(&replace_parameters(template, record)))
    }

    /// The click action of a row, after the override hook.
    ///
    /// `None` when the list has no record action or the hook disabled it.
    pub fn record_action(&self, record: &Record) -> Option<RecordAction> {
        if !self.has_record_action() {
            return None;
        }

        let mut url = self.record_url(record);
        let mut onclick = self.record_on_click(record);

        match self
            .hooks
            .override_record_action(record, url.as_deref(), onclick.as_deref())
        {
            Some(RecordActionOverride::Url(target)) => {
                url = Some(self.services.backend_url(&target));
            }
            Some(RecordActionOverride::Action {
                url: url_override,
                onclick: onclick_override,
                clickable,
            }) => {
                if let Some(replacement) = onclick_override {
                    onclick = replacement.as_deref().map(onclick_attribute);
                }
                if let Some(replacement) = url_override {
                    url = Some(match replacement {
                        Some(target) => self.services.backend_url(&target),
                        None => NO_ACTION_URL.to_string(),
                    });
                }
                if clickable == Some(false) {
                    return None;
                }
            }
            None => {}
        }

        Some(RecordAction { url, onclick })
    }

    /// CSS class for a row, from the row class hook.
    pub fn row_class(&self, record: &Record) -> String {
        self.hooks.inject_row_class(record, "").unwrap_or_default()
    }

    /// The checked row keys from the request.
    pub fn checked_rows(&self) -> &[String] {
        &self.checked
    }

    /// The checked row keys as a JSON array, or empty if encoding fails.
    pub fn checked_rows_encoded(&self) -> String {
        match serde_json::to_string(&self.checked) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode checked rows for list '{}': {}", self.id, e);
                String::new()
            }
        }
    }

    pub fn is_row_checked(&self, record: &Record) -> bool {
        record
            .key()
            .is_some_and(|key| self.checked.contains(&key.to_text()))
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    pub(super) fn preference<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, Error> {
        match &self.preferences {
            Some(preferences) => Ok(preferences.get(key)?),
            None => Ok(None),
        }
    }

    pub(super) fn put_preference<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), Error> {
        if let Some(preferences) = &self.preferences {
            preferences.put(key, value)?;
        }
        Ok(())
    }

    pub(super) fn reset_preference(&self, key: &str) -> Result<(), Error> {
        if let Some(preferences) = &self.preferences {
            preferences.reset(key)?;
        }
        Ok(())
    }
}

/// Replaces `:name` placeholders with record attributes.
fn replace_parameters(template: &str, record: &Record) -> String {
    URL_PARAMETER
        .replace_all(template, |captures: &Captures| {
            record
                .get(&captures[1])
                .map(Value::to_text)
                .unwrap_or_default()
        })
        .into_owned()
}

fn onclick_attribute(script: &str) -> String {
    format!("onclick=\"{}\"", escape_html(script))
}
