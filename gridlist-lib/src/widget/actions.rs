//! Request-scoped list actions

use log::debug;
use log::info;

use super::ActionResponse;
use super::CellView;
use super::ColumnView;
use super::ListView;
use super::ListWidget;
use super::PaginationView;
use super::RowView;
use super::SetupColumnView;
use super::SetupView;
use crate::error::Error;
use crate::pagination::RecordPage;
use crate::storage::PREF_ORDER;
use crate::storage::PREF_PER_PAGE;
use crate::storage::PREF_SORT;
use crate::storage::PREF_VISIBLE;

/// Page sizes offered by the setup form unless configured.
pub const DEFAULT_PER_PAGE_OPTIONS: [usize; 5] = [20, 40, 80, 100, 120];

impl ListWidget {
    // =========================================================================
    // Rendering
    // =========================================================================

    /// Runs the whole pipeline and assembles the list view.
    pub fn prepare_view(&mut self) -> Result<ListView, Error> {
        let resolved = self.resolve_columns()?;
        let sort_column = self.sort_column()?;
        let sort_direction = self.sort_direction();
        let page = self.records()?;

        let evaluator = self.evaluator();
        let columns = resolved
            .visible
            .iter()
            .map(|column| ColumnView {
                name: column.name.clone(),
                label: evaluator.header_value(column),
                column_type: column.column_type.to_string(),
                sortable: column.sortable,
                sorted: (sort_column.as_deref() == Some(column.name.as_str()))
                    .then_some(sort_direction),
                css_class: column.css_class.clone(),
                head_css_class: column.head_css_class.clone(),
                width: column.width.clone(),
                align: column.align.clone(),
            })
            .collect();

        let mut rows = Vec::with_capacity(page.count());
        for record in page.records() {
            let cells = resolved
                .visible
                .iter()
                .map(|column| {
                    Ok(CellView {
                        column: column.name.clone(),
                        value: evaluator.value(record, column)?,
                        clickable: column.clickable,
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?;

            rows.push(RowView {
                key: record.key().cloned(),
                css_class: self.row_class(record),
                checked: self.is_row_checked(record),
                action: self.record_action(record),
                cells,
            });
        }

        Ok(ListView {
            id: self.id.clone(),
            css_classes: self.css_classes(),
            columns,
            column_total: self.total_columns()?,
            rows,
            no_records_message: self.no_records_message(),
            show_checkboxes: self.config.show_checkboxes,
            show_setup: self.config.show_setup,
            show_pagination: self.show_pagination,
            show_page_numbers: self.config.show_page_numbers,
            show_sorting: self.config.show_sorting,
            sort_column,
            sort_direction,
            pagination: self.pagination_view(&page),
            checked_rows: self.checked_rows_encoded(),
        })
    }

    fn pagination_view(&self, page: &RecordPage) -> PaginationView {
        if !self.show_pagination {
            return PaginationView {
                page_current: 1,
                record_total: Some(page.count()),
                ..PaginationView::default()
            };
        }

        if self.config.show_page_numbers {
            PaginationView {
                page_current: page.current_page(),
                record_total: page.total(),
                page_last: page.last_page(),
                page_from: page.first_item(),
                page_to: page.last_item(),
                has_more_pages: None,
            }
        } else {
            PaginationView {
                page_current: page.current_page(),
                has_more_pages: Some(page.has_more_pages()),
                ..PaginationView::default()
            }
        }
    }

    /// Renders the list container.
    pub fn render(&mut self) -> Result<String, Error> {
        let view = self.prepare_view()?;
        let context = serde_json::to_value(&view)?;
        Ok(self.services.renderer.render_partial("list-container", &context))
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Redraws the list.
    pub fn on_refresh(&mut self) -> Result<ActionResponse, Error> {
        Ok(ActionResponse::list(self.prepare_view()?))
    }

    /// Shows the requested page.
    pub fn on_paginate(&mut self, page: Option<usize>) -> Result<ActionResponse, Error> {
        self.current_page = page;
        self.on_refresh()
    }

    /// Redraws from the first page after the filters changed.
    pub fn on_filter(&mut self) -> Result<ActionResponse, Error> {
        self.current_page = Some(1);
        self.on_refresh()
    }

    /// Toggles the sort on `column`, keeping the requested page.
    ///
    /// The sort choice is stored only once the list rendered.
    pub fn on_sort(&mut self, column: &str, page: Option<usize>) -> Result<ActionResponse, Error> {
        if column.is_empty() {
            return self.on_refresh();
        }

        let preference = self.toggle_sort(column)?;
        self.current_page = page;

        let response = self.on_refresh()?;
        self.put_preference(PREF_SORT, &preference)?;
        debug!(
            "Sorted list '{}' by '{}' {}",
            self.id, preference.column, preference.direction
        );
        Ok(response)
    }

    /// The setup form: every column, marked visible or not, and the page sizes.
    pub fn on_load_setup(&mut self) -> Result<ActionResponse, Error> {
        let resolved = self.resolve_columns()?;
        let columns = resolved
            .all
            .iter()
            .map(|column| {
                let visible = resolved.visible.get(&column.name);
                SetupColumnView {
                    name: column.name.clone(),
                    label: self.header_value(visible.unwrap_or(column)),
                    invisible: visible.is_none(),
                }
            })
            .collect();

        let view = SetupView {
            title: self
                .services
                .translator
                .translate("backend::lang.list.setup_title"),
            columns,
            per_page_options: self.per_page_options(),
            records_per_page: self.records_per_page,
        };
        Ok(ActionResponse::setup(&self.id, view))
    }

    /// Stores the user's setup and redraws.
    ///
    /// The visible set is stored only when a non-empty list is given. The
    /// page size falls back to the current one.
    pub fn on_apply_setup(
        &mut self,
        visible: Option<Vec<String>>,
        per_page: Option<usize>,
        order: Option<Vec<String>>,
    ) -> Result<ActionResponse, Error> {
        if let Some(visible) = visible.filter(|visible| !visible.is_empty()) {
            self.put_preference(PREF_VISIBLE, &visible)?;
            self.column_override = Some(visible);
        }

        if per_page.is_some() {
            self.records_per_page = per_page;
        }

        self.put_preference(PREF_ORDER, &order.unwrap_or_default())?;
        self.put_preference(PREF_PER_PAGE, &self.records_per_page)?;
        self.resolved = None;

        info!("Applied setup for list '{}'", self.id);
        self.on_refresh()
    }

    /// Clears the stored setup and redraws.
    pub fn on_reset_setup(&mut self) -> Result<ActionResponse, Error> {
        self.reset_preference(PREF_VISIBLE)?;
        self.reset_preference(PREF_PER_PAGE)?;
        self.reset_preference(PREF_ORDER)?;
        self.column_override = None;
        self.resolved = None;

        info!("Reset setup for list '{}'", self.id);
        self.on_refresh()
    }

    /// Page sizes for the setup form, including the current one, ascending.
    pub fn per_page_options(&self) -> Vec<usize> {
        let mut options = self
            .config
            .per_page_options
            .clone()
            .unwrap_or_else(|| DEFAULT_PER_PAGE_OPTIONS.to_vec());
        if let Some(current) = self.records_per_page
            && !options.contains(&current)
        {
            options.push(current);
        }
        options.sort_unstable();
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MemoryExecutor;
    use crate::model::EntityDefinition;
    use crate::model::Record;
    use crate::widget::ListConfig;

    fn widget(config: ListConfig) -> ListWidget {
        let records = (1..=3)
            .map(|id| Record::new("Movie").set("id", id).set("title", format!("Movie {id}")))
            .collect();
        ListWidget::builder("movies")
            .model(EntityDefinition::new("Movie", "movies"))
            .config(config)
            .executor(MemoryExecutor::new(records))
            .build()
            .unwrap()
    }

    #[test]
    fn test_per_page_options_include_current() {
        let list = widget(ListConfig::new().with_column("title", "Title").with_records_per_page(25));
        assert_eq!(list.per_page_options(), vec![20, 25, 40, 80, 100, 120]);

        let list = widget(
            ListConfig::new()
                .with_column("title", "Title")
                .with_records_per_page(10)
                .with_per_page_options(vec![50, 10]),
        );
        assert_eq!(list.per_page_options(), vec![10, 50]);
    }

    #[test]
    fn test_unpaginated_view() {
        let mut list = widget(ListConfig::new().with_column("title", "Title"));
        let view = list.prepare_view().unwrap();
        assert!(!view.show_pagination);
        assert_eq!(view.pagination.page_current, 1);
        assert_eq!(view.pagination.record_total, Some(3));
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.checked_rows, "[]");
    }

    #[test]
    fn test_response_is_keyed_by_target() {
        let mut list = widget(ListConfig::new().with_column("title", "Title"));
        let response = list.on_refresh().unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["#movies"]["rows"].is_array());
    }

    #[test]
    fn test_load_setup_marks_invisible_columns() {
        let mut list = widget(
            ListConfig::new()
                .with_column("title", "Title")
                .with_column("year", serde_json::json!({ "invisible": true })),
        );
        let response = list.on_load_setup().unwrap();
        let setup = response.setup_view().unwrap();
        assert_eq!(setup.columns.len(), 2);
        assert!(!setup.columns[0].invisible);
        assert!(setup.columns[1].invisible);
        assert_eq!(setup.per_page_options, DEFAULT_PER_PAGE_OPTIONS.to_vec());
    }
}
