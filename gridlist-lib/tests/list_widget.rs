//! End-to-end tests for the list widget against in-memory fakes.

use std::sync::Arc;

use serde_json::json;

use gridlist_lib::ListConfig;
use gridlist_lib::ListWidget;
use gridlist_lib::executor::MemoryExecutor;
use gridlist_lib::hooks::ExtensionHooks;
use gridlist_lib::hooks::RecordActionOverride;
use gridlist_lib::model::EntityDefinition;
use gridlist_lib::model::Record;
use gridlist_lib::model::RelationDefinition;
use gridlist_lib::query::Direction;
use gridlist_lib::query::SearchMode;
use gridlist_lib::storage::MemoryBackend;
use gridlist_lib::storage::PreferenceStore;
use gridlist_lib::storage::SessionStore;
use gridlist_lib::storage::StorageBackend;

// =============================================================================
// Fixtures
// =============================================================================

fn entity() -> EntityDefinition {
    EntityDefinition::new("Movie", "movies")
        .with_relation("director", RelationDefinition::belongs_to("Person", "people"))
        .with_relation(
            "genres",
            RelationDefinition::belongs_to_many("Genre", "genres", "movie_genres"),
        )
}

fn person(name: &str) -> Record {
    Record::new("Person").set("name", name)
}

fn genre(title: &str) -> Record {
    Record::new("Genre").set("title", title)
}

fn movies() -> Vec<Record> {
    vec![
        Record::new("Movie")
            .set("id", 1)
            .set("title", "Alien")
            .set("year", 1979)
            .set("budget", 11)
            .with_relation("director", person("Ridley Scott"))
            .with_relation("genres", vec![genre("Horror"), genre("Science Fiction")]),
        Record::new("Movie")
            .set("id", 2)
            .set("title", "Blade Runner")
            .set("year", 1982)
            .set("budget", 28)
            .with_relation("director", person("Ridley Scott"))
            .with_relation("genres", vec![genre("Science Fiction")]),
        Record::new("Movie")
            .set("id", 3)
            .set("title", "Heat")
            .set("year", 1995)
            .set("budget", "")
            .with_relation("director", person("Michael Mann"))
            .with_relation("genres", vec![genre("Crime")]),
    ]
}

fn numbered(count: usize) -> Vec<Record> {
    (1..=count)
        .map(|id| {
            Record::new("Movie")
                .set("id", id)
                .set("title", format!("Movie {id:03}"))
        })
        .collect()
}

fn config() -> ListConfig {
    ListConfig::new()
        .with_column("title", json!({ "label": "Title", "searchable": true }))
        .with_column("year", json!({ "label": "Year", "type": "number" }))
        .with_column(
            "director",
            json!({
                "label": "Director",
                "relation": "director",
                "valueFrom": "name",
                "searchable": true,
            }),
        )
}

fn widget(config: ListConfig, records: Vec<Record>) -> ListWidget {
    ListWidget::builder("movies")
        .model(entity())
        .config(config)
        .executor(MemoryExecutor::new(records))
        .build()
        .unwrap()
}

fn stored_widget(
    config: ListConfig,
    records: Vec<Record>,
    backend: &Arc<MemoryBackend>,
) -> ListWidget {
    let backend: Arc<dyn StorageBackend> = backend.clone();
    ListWidget::builder("movies")
        .model(entity())
        .config(config)
        .preferences(PreferenceStore::new(backend.clone(), "7", "movies"))
        .session(SessionStore::new(backend, "session-1", "movies"))
        .executor(MemoryExecutor::new(records))
        .build()
        .unwrap()
}

fn titles(widget: &mut ListWidget) -> Vec<String> {
    let view = widget.prepare_view().unwrap();
    let position = view
        .columns
        .iter()
        .position(|column| column.name == "title")
        .unwrap();
    view.rows
        .iter()
        .map(|row| row.cells[position].value.clone().unwrap_or_default())
        .collect()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_missing_model_is_rejected() {
    let error = ListWidget::builder("movies")
        .config(config())
        .executor(MemoryExecutor::default())
        .build()
        .unwrap_err();
    assert!(error.is_configuration());
    assert!(error.to_string().contains("has no model"));
}

#[test]
fn test_missing_columns_is_rejected() {
    let mut list = widget(ListConfig::new(), movies());
    assert!(list.prepare_view().unwrap_err().is_configuration());
}

#[test]
fn test_unknown_column_lookup() {
    let mut list = widget(config(), movies());
    assert_eq!(list.column("year").unwrap().label, "Year");
    assert!(list.column("rating").unwrap_err().is_configuration());
}

// =============================================================================
// Sorting
// =============================================================================

#[test]
fn test_default_sort_is_first_sortable_visible_descending() {
    let mut list = widget(config(), movies());
    assert_eq!(list.sort_column().unwrap().as_deref(), Some("title"));
    assert_eq!(list.sort_direction(), Direction::Desc);
    assert_eq!(titles(&mut list), ["Heat", "Blade Runner", "Alien"]);
}

#[test]
fn test_configured_default_sort() {
    let by_year = config().with_default_sort(serde_json::from_value(json!("year")).unwrap());
    let mut list = widget(by_year, movies());
    assert_eq!(list.sort_column().unwrap().as_deref(), Some("year"));
    assert_eq!(list.sort_direction(), Direction::Desc);

    let ascending = config().with_default_sort(
        serde_json::from_value(json!({ "column": "year", "direction": "asc" })).unwrap(),
    );
    let mut list = widget(ascending, movies());
    assert_eq!(titles(&mut list), ["Alien", "Blade Runner", "Heat"]);
}

#[test]
fn test_unsortable_default_falls_back() {
    let config = ListConfig::new()
        .with_column("title", json!({ "sortable": false }))
        .with_column("year", json!({}))
        .with_default_sort(serde_json::from_value(json!("title")).unwrap());
    let mut list = widget(config, movies());
    assert_eq!(list.sort_column().unwrap().as_deref(), Some("year"));
    assert_eq!(list.sort_direction(), Direction::Desc);
}

#[test]
fn test_no_sortable_columns() {
    let config = ListConfig::new().with_column("title", json!({ "sortable": false }));
    let mut list = widget(config, movies());
    assert_eq!(list.sort_column().unwrap(), None);
    assert!(list.prepare_view().unwrap().sort_column.is_none());
}

#[test]
fn test_toggle_sort_cycles() {
    let backend = Arc::new(MemoryBackend::new());
    let mut list = stored_widget(config(), movies(), &backend);

    let response = list.on_sort("year", None).unwrap();
    let view = response.list_view().unwrap();
    assert_eq!(view.sort_column.as_deref(), Some("year"));
    assert_eq!(view.sort_direction, Direction::Desc);

    list.on_sort("year", None).unwrap();
    assert_eq!(list.sort_direction(), Direction::Asc);

    list.on_sort("year", None).unwrap();
    assert_eq!(list.sort_direction(), Direction::Desc);

    list.on_sort("title", None).unwrap();
    assert_eq!(list.sort_direction(), Direction::Desc);

    let mut restored = stored_widget(config(), movies(), &backend);
    assert_eq!(restored.sort_column().unwrap().as_deref(), Some("title"));
    assert_eq!(restored.sort_direction(), Direction::Desc);
}

#[test]
fn test_failed_sort_persists_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    let broken = config().with_column("rating", json!({ "type": "selectable" }));
    let mut list = stored_widget(broken, movies(), &backend);
    assert!(list.on_sort("year", None).unwrap_err().is_configuration());

    let mut restored = stored_widget(config(), movies(), &backend);
    assert_eq!(restored.sort_column().unwrap().as_deref(), Some("title"));
}

// =============================================================================
// Pagination
// =============================================================================

#[test]
fn test_page_clamps_to_last_page() {
    let config = config().with_records_per_page(20);

    let mut list = widget(config.clone(), numbered(41));
    let response = list.on_paginate(Some(3)).unwrap();
    let pagination = &response.list_view().unwrap().pagination;
    assert_eq!(pagination.page_current, 3);
    assert_eq!(pagination.record_total, Some(41));
    assert_eq!(pagination.page_last, Some(3));
    assert_eq!(pagination.page_from, Some(41));
    assert_eq!(pagination.page_to, Some(41));

    let mut list = widget(config, numbered(20));
    let response = list.on_paginate(Some(3)).unwrap();
    assert_eq!(response.list_view().unwrap().pagination.page_current, 1);
}

#[test]
fn test_huge_page_clamps_to_last_page() {
    let config = config().with_records_per_page(2);
    let mut list = widget(config, movies());

    let response = list.on_paginate(Some(usize::MAX)).unwrap();
    let view = response.list_view().unwrap();
    assert_eq!(view.pagination.page_current, 2);
    assert_eq!(view.pagination.page_last, Some(2));
    assert_eq!(view.pagination.page_from, Some(3));
    assert_eq!(view.rows.len(), 1);
}

#[test]
fn test_last_visited_page_is_restored() {
    let backend = Arc::new(MemoryBackend::new());
    let config = config().with_records_per_page(20);

    let mut list = stored_widget(config.clone(), numbered(45), &backend);
    list.on_paginate(Some(2)).unwrap();

    let mut list = stored_widget(config.clone(), numbered(45), &backend);
    let view = list.prepare_view().unwrap();
    assert_eq!(view.pagination.page_current, 2);

    let response = list.on_filter().unwrap();
    assert_eq!(response.list_view().unwrap().pagination.page_current, 1);
}

#[test]
fn test_simple_pagination() {
    let config = config().with_records_per_page(20).with_page_numbers(false);
    let mut list = widget(config, numbered(45));
    let view = list.on_paginate(Some(2)).unwrap().list_view().cloned().unwrap();
    assert_eq!(view.rows.len(), 20);
    assert_eq!(view.pagination.has_more_pages, Some(true));
    assert_eq!(view.pagination.record_total, None);
}

// =============================================================================
// Cell values
// =============================================================================

#[test]
fn test_multi_relation_values_are_joined() {
    let config = config().with_column(
        "genres",
        json!({ "relation": "genres", "valueFrom": "title", "sortable": false }),
    );
    let mut list = widget(config, movies());
    list.set_sort("year", Direction::Asc);

    let view = list.prepare_view().unwrap();
    let genres: Vec<_> = view
        .rows
        .iter()
        .map(|row| row.cells[3].value.clone())
        .collect();
    assert_eq!(
        genres,
        [
            Some("Horror, Science Fiction".to_string()),
            Some("Science Fiction".to_string()),
            Some("Crime".to_string()),
        ]
    );
}

#[test]
fn test_empty_number_uses_default() {
    let config = ListConfig::new()
        .with_column("title", "Title")
        .with_column("budget", json!({ "type": "number", "default": "n/a", "format": "$%dM" }));
    let mut list = widget(config, movies());
    list.set_sort("title", Direction::Asc);

    let view = list.prepare_view().unwrap();
    let budgets: Vec<_> = view.rows.iter().map(|row| row.cells[1].value.clone()).collect();
    assert_eq!(
        budgets,
        [
            Some("$11M".to_string()),
            Some("$28M".to_string()),
            Some("$0M".to_string()),
        ]
    );

    let config = ListConfig::new()
        .with_column("title", "Title")
        .with_column("budget", json!({ "type": "number", "default": "n/a" }));
    let mut list = widget(config, movies());
    list.set_sort("title", Direction::Asc);
    let view = list.prepare_view().unwrap();
    assert_eq!(view.rows[2].cells[1].value.as_deref(), Some("n/a"));
}

#[test]
fn test_summary_column_is_shortened() {
    let synopsis = "<p>A commercial crew is awakened from cryo-sleep</p>";
    let records = vec![Record::new("Movie").set("id", 1).set("synopsis", synopsis)];
    let config = ListConfig::new()
        .with_column("synopsis", json!({ "type": "summary", "limitChars": 10 }));
    let mut list = widget(config, records);

    let view = list.prepare_view().unwrap();
    let summary = view.rows[0].cells[0].value.clone().unwrap();
    assert!(summary.ends_with("..."));
    assert!(summary.len() < "A commercial crew is awakened from cryo-sleep".len());
}

#[test]
fn test_invalid_datetime_aborts_render() {
    let records = vec![Record::new("Movie").set("id", 1).set("released", "someday")];
    let config = ListConfig::new().with_column("released", json!({ "type": "date" }));
    let mut list = widget(config, records);
    assert!(list.prepare_view().unwrap_err().is_data());
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn test_search_all_mode_needs_every_word() {
    let mut list = widget(config(), movies());
    list.set_sort("year", Direction::Asc);

    list.set_search_term("blade runner", true);
    assert_eq!(titles(&mut list), ["Blade Runner"]);

    list.set_search_term("runner alien", true);
    assert!(titles(&mut list).is_empty());

    list.set_search_term("ridley scott", true);
    assert_eq!(titles(&mut list), ["Alien", "Blade Runner"]);
}

#[test]
fn test_search_through_relation_select_column() {
    let config = ListConfig::new()
        .with_column("title", "Title")
        .with_column("year", json!({ "type": "number" }))
        .with_column(
            "director_name",
            json!({ "relation": "director", "select": "@name", "searchable": true }),
        );
    let mut list = widget(config, movies());
    list.set_sort("year", Direction::Asc);

    list.set_search_term("mann", true);
    let view = list.prepare_view().unwrap();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].cells[0].value.as_deref(), Some("Heat"));
    assert_eq!(view.rows[0].cells[2].value.as_deref(), Some("Michael Mann"));
}

#[test]
fn test_search_through_invisible_select_column() {
    let config = ListConfig::new().with_column("title", "Title").with_column(
        "label",
        json!({ "select": "title", "searchable": true, "invisible": true }),
    );
    let mut list = widget(config, movies());

    list.set_search_term("heat", true);
    assert_eq!(titles(&mut list), ["Heat"]);

    list.set_search_term("runner", true);
    assert_eq!(titles(&mut list), ["Blade Runner"]);
}

#[test]
fn test_search_any_and_exact_modes() {
    let mut list = widget(config(), movies());
    list.set_sort("year", Direction::Asc);

    list.set_search_options(Some(SearchMode::Any), None);
    list.set_search_term("heat alien", true);
    assert_eq!(titles(&mut list), ["Alien", "Heat"]);

    list.set_search_options(Some(SearchMode::Exact), None);
    list.set_search_term("runner blade", true);
    assert!(titles(&mut list).is_empty());
    list.set_search_term("blade runner", true);
    assert_eq!(titles(&mut list), ["Blade Runner"]);
}

#[test]
fn test_named_search_scope() {
    let mut list = widget(config(), movies());
    list.set_sort("year", Direction::Asc);
    list.register_search_scope("by_year", |term, _fields| {
        gridlist_lib::query::Filter::eq("year", term.parse::<i64>().unwrap_or_default())
    });

    list.set_search_options(None, Some("by_year".to_string()));
    list.set_search_term("1982", true);
    assert_eq!(titles(&mut list), ["Blade Runner"]);

    list.set_search_options(None, Some("missing".to_string()));
    assert!(list.prepare_view().unwrap_err().is_configuration());
}

#[test]
fn test_filter_callbacks() {
    let mut list = widget(config(), movies());
    list.set_sort("year", Direction::Asc);
    list.add_filter(|query| {
        query.filter(gridlist_lib::query::Filter::gt("year", 1980));
    });
    assert_eq!(titles(&mut list), ["Blade Runner", "Heat"]);
}

// =============================================================================
// Setup
// =============================================================================

#[test]
fn test_apply_setup_round_trips() {
    let backend = Arc::new(MemoryBackend::new());
    let config = config().with_setup(true).with_records_per_page(20);

    let mut list = stored_widget(config.clone(), movies(), &backend);
    list.on_apply_setup(
        Some(vec!["year".to_string(), "title".to_string()]),
        Some(40),
        Some(vec!["year".to_string()]),
    )
    .unwrap();
    assert_eq!(list.visible_columns().unwrap().names(), ["year", "title"]);
    assert_eq!(list.records_per_page(), Some(40));

    let mut restored = stored_widget(config.clone(), movies(), &backend);
    assert_eq!(restored.visible_columns().unwrap().names(), ["year", "title"]);
    assert_eq!(restored.columns().unwrap().names(), ["year", "title", "director"]);
    assert_eq!(restored.records_per_page(), Some(40));
    assert_eq!(restored.total_columns().unwrap(), 3);

    restored.on_reset_setup().unwrap();
    let mut reset = stored_widget(config, movies(), &backend);
    assert_eq!(
        reset.visible_columns().unwrap().names(),
        ["title", "year", "director"]
    );
    assert_eq!(reset.records_per_page(), Some(20));
}

#[test]
fn test_apply_setup_keeps_visible_when_empty() {
    let backend = Arc::new(MemoryBackend::new());
    let config = config().with_setup(true);

    let mut list = stored_widget(config.clone(), movies(), &backend);
    list.on_apply_setup(Some(vec!["title".to_string()]), None, None)
        .unwrap();
    list.on_apply_setup(Some(Vec::new()), None, None).unwrap();

    let mut restored = stored_widget(config, movies(), &backend);
    assert_eq!(restored.visible_columns().unwrap().names(), ["title"]);
}

#[test]
fn test_load_setup_lists_all_columns() {
    let config = config()
        .with_column("budget", json!({ "invisible": true }))
        .with_records_per_page(25);
    let mut list = widget(config, movies());

    let response = list.on_load_setup().unwrap();
    assert_eq!(response.target, "#movies");
    let setup = response.setup_view().unwrap();
    let hidden: Vec<_> = setup
        .columns
        .iter()
        .filter(|column| column.invisible)
        .map(|column| column.name.as_str())
        .collect();
    assert_eq!(hidden, ["budget"]);
    assert_eq!(setup.per_page_options, [20, 25, 40, 80, 100, 120]);
}

// =============================================================================
// Rows
// =============================================================================

#[test]
fn test_record_actions() {
    let config = config().with_record_url("movies/update/:id");
    let mut hooks = ExtensionHooks::new();
    hooks.on_override_record_action(|record, _, _| match record.get("title")?.as_str()? {
        "Heat" => Some(RecordActionOverride::Action {
            url: None,
            onclick: None,
            clickable: Some(false),
        }),
        "Alien" => Some(RecordActionOverride::Url("movies/preview/1".to_string())),
        _ => None,
    });

    let mut list = ListWidget::builder("movies")
        .model(entity())
        .config(config)
        .hooks(hooks)
        .executor(MemoryExecutor::new(movies()))
        .build()
        .unwrap();
    list.set_sort("year", Direction::Asc);

    let view = list.prepare_view().unwrap();
    let urls: Vec<_> = view
        .rows
        .iter()
        .map(|row| row.action.as_ref().and_then(|action| action.url.clone()))
        .collect();
    assert_eq!(
        urls,
        [
            Some("/backend/movies/preview/1".to_string()),
            Some("/backend/movies/update/2".to_string()),
            None,
        ]
    );
}

#[test]
fn test_record_on_click() {
    let config = config().with_record_on_click("popup(:id)");
    let list = widget(config, movies());
    let record = &movies()[0];

    let action = list.record_action(record).unwrap();
    assert_eq!(action.url.as_deref(), Some("javascript:;"));
    assert_eq!(action.onclick.as_deref(), Some("onclick=\"popup(1)\""));
}

#[test]
fn test_checked_rows_and_row_classes() {
    let mut hooks = ExtensionHooks::new();
    hooks.on_inject_row_class(|record, _| {
        (record.get("year")?.as_f64()? < 1980.0).then(|| "classic".to_string())
    });
    let mut list = ListWidget::builder("movies")
        .model(entity())
        .config(config().with_checkboxes(true))
        .hooks(hooks)
        .executor(MemoryExecutor::new(movies()))
        .build()
        .unwrap();
    list.set_sort("year", Direction::Asc);
    list.set_checked_rows(["2", "3", "2"]);

    let view = list.prepare_view().unwrap();
    assert_eq!(view.checked_rows, r#"["2","3"]"#);
    assert_eq!(view.column_total, 4);

    let checked: Vec<_> = view.rows.iter().map(|row| row.checked).collect();
    assert_eq!(checked, [false, true, true]);
    assert_eq!(view.rows[0].css_class, "classic");
    assert_eq!(view.rows[1].css_class, "");
}

#[test]
fn test_extend_columns_hook() {
    let mut hooks = ExtensionHooks::new();
    hooks.on_extend_columns(|columns, _| {
        columns.remove_column("director");
        columns.define_column("slug", "Slug").sortable = false;
    });
    let mut list = ListWidget::builder("movies")
        .model(entity())
        .config(config())
        .hooks(hooks)
        .executor(MemoryExecutor::new(movies()))
        .build()
        .unwrap();

    assert_eq!(list.columns().unwrap().names(), ["title", "year", "slug"]);
    assert!(!list.is_column_visible("director").unwrap());
}

#[test]
fn test_prepared_query_renders_sql() {
    let mut list = widget(config(), movies());
    list.set_sort("year", Direction::Asc);
    list.set_search_term("alien", true);

    let query = list.prepare_query().unwrap();
    assert_eq!(query.eager_loads(), ["director"]);

    let statement = query.to_sql(Some(20), 0).unwrap();
    assert!(statement.sql.starts_with("select movies.* from movies"));
    assert!(statement.sql.contains("exists"));
    assert!(statement.sql.ends_with("limit 20 offset 0"));
    assert!(!statement.bindings.is_empty());
}
