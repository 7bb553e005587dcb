//! Builds the list query from column definitions

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use log::debug;

use super::ComputedSelect;
use super::Direction;
use super::Field;
use super::Filter;
use super::ListQuery;
use super::SearchScopes;
use super::SearchState;
use super::match_term;
use crate::column::ColumnDefinition;
use crate::column::ColumnRegistry;
use crate::error::ConfigurationError;
use crate::hooks::ExtensionHooks;
use crate::model::EntityDefinition;
use crate::model::RelationDefinition;
use crate::model::RelationKind;
use crate::model::Value;
use crate::util::snake_case;

/// A caller supplied query mutation, applied after search and sort.
pub type FilterCallback = Box<dyn Fn(&mut ListQuery)>;

/// Replaces the `@` placeholder with `table.`.
pub fn parse_table_name(sql: &str, table: &str) -> String {
    sql.replace('@', &format!("{table}."))
}

/// Returns the relation a column is bound to, if it is an entity relation.
///
/// Pivot columns are not entity relations. An unknown relation is an error.
pub fn column_relation<'e>(
    entity: &'e EntityDefinition,
    column: &ColumnDefinition,
) -> Result<Option<&'e RelationDefinition>, ConfigurationError> {
    match column.relation.as_deref() {
        None => Ok(None),
        Some(_) if column.is_pivot() => Ok(None),
        Some(relation) => entity.require_relation(relation).map(Some),
    }
}

/// Composes a [`ListQuery`] from the columns, search, sort and filters of a
/// list, without executing it.
///
/// # Example
///
/// ```
/// use gridlist_lib::column::ColumnRegistry;
/// use gridlist_lib::model::EntityDefinition;
/// use gridlist_lib::query::{Direction, QueryBuilder};
///
/// let entity = EntityDefinition::new("Movie", "movies");
/// let mut columns = ColumnRegistry::new();
/// columns.define_column("title", "Title").searchable = true;
///
/// let query = QueryBuilder::new(&entity.into(), &columns, &columns)
///     .sort("title", Direction::Asc)
///     .build()
///     .unwrap();
/// assert_eq!(query.order().unwrap().fields()[0].0, "title");
/// ```
pub struct QueryBuilder<'a> {
    entity: &'a Arc<EntityDefinition>,
    columns: &'a ColumnRegistry,
    visible: &'a ColumnRegistry,
    search: Option<&'a SearchState>,
    scopes: Option<&'a SearchScopes>,
    sort: Option<(&'a str, Direction)>,
    filters: &'a [FilterCallback],
    hooks: Option<&'a ExtensionHooks>,
}

impl<'a> QueryBuilder<'a> {
    /// Creates a builder over all columns and the visible subset.
    pub fn new(
        entity: &'a Arc<EntityDefinition>,
        columns: &'a ColumnRegistry,
        visible: &'a ColumnRegistry,
    ) -> Self {
        Self {
            entity,
            columns,
            visible,
            search: None,
            scopes: None,
            sort: None,
            filters: &[],
            hooks: None,
        }
    }

    /// Applies a search.
    pub fn search(mut self, search: &'a SearchState, scopes: &'a SearchScopes) -> Self {
        self.search = Some(search);
        self.scopes = Some(scopes);
        self
    }

    /// Sorts by the named column.
    pub fn sort(mut self, column: &'a str, direction: Direction) -> Self {
        self.sort = Some((column, direction));
        self
    }

    /// Applies filter callbacks in order.
    pub fn filters(mut self, filters: &'a [FilterCallback]) -> Self {
        self.filters = filters;
        self
    }

    /// Invites the query hooks.
    pub fn hooks(mut self, hooks: &'a ExtensionHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Builds the query.
    pub fn build(self) -> Result<ListQuery, ConfigurationError> {
        let entity = self.entity.as_ref();
        let primary_table = entity.table.as_str();

        let mut query = ListQuery::new(Arc::clone(self.entity));
        if let Some(hooks) = self.hooks {
            hooks.before_query_build(&mut query);
        }

        // Searchable fields
        let term = self.search.and_then(SearchState::active_term);
        let mut primary_searchable = Vec::new();
        let mut relation_searchable: HashMap<String, Vec<Field>> = HashMap::new();

        if term.is_some() {
            for column in self.columns.iter().filter(|column| column.searchable) {
                match column_relation(entity, column)? {
                    Some(relation) => {
                        let field = match &column.sql_select {
                            Some(sql) => {
                                let expression = parse_table_name(sql, &relation.table);
                                match plain_column(&expression, &relation.table) {
                                    Some(plain) => Field::column(relation.table.clone(), plain),
                                    None => Field::expression(expression, column.name.clone()),
                                }
                            }
                            None => Field::column(
                                relation.table.clone(),
                                column.value_from.clone().unwrap_or_else(|| column.name.clone()),
                            ),
                        };
                        if let Some(name) = &column.relation {
                            relation_searchable.entry(name.clone()).or_default().push(field);
                        }
                    }
                    None => {
                        let field = match &column.sql_select {
                            Some(sql) => {
                                let expression = parse_table_name(sql, primary_table);
                                match plain_column(&expression, primary_table) {
                                    Some(plain) => Field::text(primary_table, plain),
                                    None => Field::expression(expression, column.name.clone()),
                                }
                            }
                            None => Field::text(primary_table, column.name.clone()),
                        };
                        primary_searchable.push(field);
                    }
                }
            }
        }

        // Eager loads, counts and joins from visible columns
        let mut joins: IndexSet<String> = IndexSet::new();
        for column in self.visible.iter() {
            if column.is_relation_count()
                && let Some(relation) = &column.relation
            {
                query.with_count(relation.clone());
            }

            if column_relation(entity, column)?.is_none()
                || (column.sql_select.is_none() && column.value_from.is_none())
            {
                continue;
            }
            let Some(name) = column.relation.clone() else {
                continue;
            };
            if column.value_from.is_some() {
                query.with(name.clone());
            }
            joins.insert(name);
        }

        // Search
        if let (Some(term), Some(search)) = (term, self.search) {
            let scope = match &search.scope {
                Some(name) => Some(self.scopes.map_or_else(
                    || {
                        Err(ConfigurationError::UnknownSearchScope {
                            scope: name.clone(),
                        })
                    },
                    |scopes| scopes.get(name),
                )?),
                None => None,
            };
            let matcher = |fields: &[Field]| -> Option<Filter> {
                if fields.is_empty() {
                    return None;
                }
                match scope {
                    Some(scope) => Some(scope(term, fields)),
                    None => match_term(term, fields, search.mode),
                }
            };

            let mut group = Vec::new();
            if let Some(filter) = matcher(&primary_searchable) {
                group.push(filter);
            }
            for join in &joins {
                let fields = relation_searchable.get(join).map(Vec::as_slice).unwrap_or(&[]);
                if let Some(filter) = matcher(fields) {
                    group.push(Filter::exists(join.clone(), filter));
                }
            }
            if !group.is_empty() {
                query.filter(Filter::or(group));
            }
        }

        // Computed selects
        let mut selects = Vec::new();
        let mut bindings: Vec<Value> = Vec::new();
        for column in self.visible.iter() {
            let Some(sql_select) = &column.sql_select else {
                continue;
            };

            match &column.relation {
                Some(name) if !column.is_pivot() => {
                    let relation = entity.require_relation(name)?;
                    if relation.kind == RelationKind::MorphTo {
                        return Err(ConfigurationError::UnsupportedMorphTo {
                            relation: name.clone(),
                        });
                    }
                    let expression = parse_table_name(sql_select, &relation.table);
                    let aggregate = relation.kind.is_multi();
                    let correlation = relation.correlate(name, entity)?;
                    let select = if aggregate {
                        format!("group_concat({expression} separator ', ')")
                    } else {
                        expression.clone()
                    };
                    selects.push(ComputedSelect {
                        alias: column.name.clone(),
                        sql: format!(
                            "(select {select} from {} where {})",
                            correlation.from, correlation.constraint
                        ),
                        relation: Some(name.clone()),
                        aggregate,
                        source: plain_column(&expression, &relation.table),
                    });
                    bindings.extend(correlation.bindings);
                }
                _ => {
                    let expression = parse_table_name(sql_select, primary_table);
                    selects.push(ComputedSelect {
                        alias: column.name.clone(),
                        source: plain_column(&expression, primary_table),
                        sql: expression,
                        relation: None,
                        aggregate: false,
                    });
                }
            }
        }

        // Sort
        if let Some((sort_column, direction)) = self.sort {
            let field = match self.columns.get(sort_column) {
                Some(column) if column.is_relation_count() => {
                    let relation = column.relation.as_deref().unwrap_or_default();
                    format!("{}_count", snake_case(relation))
                }
                Some(column) => match &column.value_from {
                    Some(value_from) if column.is_pivot() => format!("pivot_{value_from}"),
                    Some(value_from) => value_from.clone(),
                    None => column.name.clone(),
                },
                None => sort_column.to_string(),
            };
            query.order_by_field(field, direction);
        }

        for callback in self.filters {
            callback(&mut query);
        }

        query.add_selects(selects);
        query.add_select_bindings(bindings);

        debug!(
            "Built list query for '{}': {} filters, {} eager loads, {} computed selects",
            entity.name,
            query.filters().len(),
            query.eager_loads().len(),
            query.selects().len()
        );

        if let Some(hooks) = self.hooks
            && let Some(replacement) = hooks.after_query_build(&mut query)
        {
            debug!("List query replaced by extension hook");
            return Ok(replacement);
        }

        Ok(query)
    }
}

/// Returns `column` when `expression` is exactly `table.column` or a bare
/// `column`.
fn plain_column(expression: &str, table: &str) -> Option<String> {
    let expression = expression.trim();
    let column = expression
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(expression);
    let plain = column
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && column
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    plain.then(|| column.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationDefinition;

    fn movie() -> Arc<EntityDefinition> {
        Arc::new(
            EntityDefinition::new("Movie", "movies")
                .with_relation(
                    "genres",
                    RelationDefinition::belongs_to_many("Genre", "genres", "movies_genres"),
                )
                .with_relation("director", RelationDefinition::belongs_to("Person", "people"))
                .with_relation("owner", RelationDefinition::morph_to("owner")),
        )
    }

    fn columns() -> ColumnRegistry {
        let mut columns = ColumnRegistry::new();
        columns.define_column("title", "Title").searchable = true;
        let genres = columns.define_column("genres", "Genres");
        genres.relation = Some("genres".to_string());
        genres.value_from = Some("title".to_string());
        genres.searchable = true;
        let director = columns.define_column("director_name", "Director");
        director.relation = Some("director".to_string());
        director.sql_select = Some("@name".to_string());
        columns
    }

    #[test]
    fn test_eager_loads_and_search_group() {
        let entity = movie();
        let columns = columns();
        let search = SearchState {
            term: Some("alien".to_string()),
            ..Default::default()
        };
        let scopes = SearchScopes::new();
        let query = QueryBuilder::new(&entity, &columns, &columns)
            .search(&search, &scopes)
            .build()
            .unwrap();

        assert_eq!(query.eager_loads(), ["genres".to_string()]);
        let Filter::Or(group) = &query.filters()[0] else {
            panic!("expected search group");
        };
        assert_eq!(group.len(), 2);
        assert!(matches!(&group[1], Filter::Exists(relation, _) if relation == "genres"));
    }

    #[test]
    fn test_select_columns_search_their_plain_column() {
        let entity = movie();
        let mut columns = ColumnRegistry::new();
        let director = columns.define_column("director_name", "Director");
        director.relation = Some("director".to_string());
        director.sql_select = Some("@name".to_string());
        director.searchable = true;
        let label = columns.define_column("label", "Label");
        label.sql_select = Some("title".to_string());
        label.searchable = true;
        let visible = columns.visible(Some(&["director_name".to_string()][..]));

        let search = SearchState {
            term: Some("mann".to_string()),
            ..Default::default()
        };
        let scopes = SearchScopes::new();
        let query = QueryBuilder::new(&entity, &columns, &visible)
            .search(&search, &scopes)
            .build()
            .unwrap();

        let Filter::Or(group) = &query.filters()[0] else {
            panic!("expected search group");
        };
        let primary = Filter::and([Filter::or([Filter::contains(
            Field::text("movies", "title"),
            "mann",
        )])]);
        let related = Filter::exists(
            "director",
            Filter::and([Filter::or([Filter::contains(
                Field::column("people", "name"),
                "mann",
            )])]),
        );
        assert_eq!(group, &vec![primary, related]);
    }

    #[test]
    fn test_plain_column() {
        assert_eq!(plain_column("movies.title", "movies").as_deref(), Some("title"));
        assert_eq!(plain_column(" title ", "movies").as_deref(), Some("title"));
        assert_eq!(plain_column("people.name", "movies"), None);
        assert_eq!(plain_column("concat(movies.a, movies.b)", "movies"), None);
        assert_eq!(plain_column("1", "movies"), None);
    }

    #[test]
    fn test_no_search_without_term() {
        let entity = movie();
        let columns = columns();
        let query = QueryBuilder::new(&entity, &columns, &columns).build().unwrap();
        assert!(query.filters().is_empty());
    }

    #[test]
    fn test_scalar_computed_select() {
        let entity = movie();
        let columns = columns();
        let query = QueryBuilder::new(&entity, &columns, &columns).build().unwrap();
        let select = &query.selects()[0];
        assert_eq!(select.alias, "director_name");
        assert_eq!(
            select.sql,
            "(select people.name from people where movies.director_id = people.id)"
        );
        assert!(!select.aggregate);
        assert_eq!(select.source.as_deref(), Some("name"));
    }

    #[test]
    fn test_multi_relation_uses_group_concat() {
        let entity = movie();
        let mut columns = ColumnRegistry::new();
        let genres = columns.define_column("genre_list", "Genres");
        genres.relation = Some("genres".to_string());
        genres.sql_select = Some("@title".to_string());

        let query = QueryBuilder::new(&entity, &columns, &columns).build().unwrap();
        assert!(query.selects()[0].sql.starts_with("(select group_concat(genres.title separator ', ')"));
        assert!(query.selects()[0].aggregate);
    }

    #[test]
    fn test_morph_to_select_is_rejected() {
        let entity = movie();
        let mut columns = ColumnRegistry::new();
        let owner = columns.define_column("owner_name", "Owner");
        owner.relation = Some("owner".to_string());
        owner.sql_select = Some("@name".to_string());

        let err = QueryBuilder::new(&entity, &columns, &columns).build().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnsupportedMorphTo { .. }));
    }

    #[test]
    fn test_unknown_relation() {
        let entity = movie();
        let mut columns = ColumnRegistry::new();
        let studio = columns.define_column("studio", "Studio");
        studio.relation = Some("studio".to_string());
        studio.value_from = Some("name".to_string());

        let err = QueryBuilder::new(&entity, &columns, &columns).build().unwrap_err();
        assert_eq!(err, ConfigurationError::unknown_relation("Movie", "studio"));
    }

    #[test]
    fn test_sort_field_resolution() {
        let entity = movie();
        let mut columns = ColumnRegistry::new();
        let role = columns.define_column("pivot[role]", "Role");
        role.relation = Some("pivot".to_string());
        role.value_from = Some("role".to_string());
        let count = columns.define_column("genre_count", "Genres");
        count.relation = Some("genres".to_string());
        count.use_relation_count = true;

        let query = QueryBuilder::new(&entity, &columns, &columns)
            .sort("pivot[role]", Direction::Desc)
            .build()
            .unwrap();
        assert_eq!(query.order().unwrap().fields()[0], ("pivot_role".to_string(), Direction::Desc));
        assert_eq!(query.counts()[0].alias, "genres_count");

        let query = QueryBuilder::new(&entity, &columns, &columns)
            .sort("genre_count", Direction::Asc)
            .build()
            .unwrap();
        assert_eq!(query.order().unwrap().fields()[0].0, "genres_count");
    }

    #[test]
    fn test_filters_and_hooks_order() {
        let entity = movie();
        let columns = columns();
        let filters: Vec<FilterCallback> = vec![
            Box::new(|q: &mut ListQuery| {
                q.filter(Filter::eq("published", true));
            }),
            Box::new(|q: &mut ListQuery| {
                q.filter(Filter::ge("year", 1980));
            }),
        ];
        let mut hooks = ExtensionHooks::new();
        hooks.on_before_query_build(|q| {
            q.filter(Filter::is_null("deleted_at"));
        });

        let query = QueryBuilder::new(&entity, &columns, &columns)
            .filters(&filters)
            .hooks(&hooks)
            .build()
            .unwrap();
        assert_eq!(
            query.filters(),
            [
                Filter::is_null("deleted_at"),
                Filter::eq("published", true),
                Filter::ge("year", 1980)
            ]
        );
    }

    #[test]
    fn test_after_build_replacement() {
        let entity = movie();
        let columns = columns();
        let mut hooks = ExtensionHooks::new();
        hooks.on_after_query_build(|q| {
            let mut replacement = ListQuery::new(q.entity_arc());
            replacement.filter(Filter::eq("id", 1));
            Some(replacement)
        });
        let query = QueryBuilder::new(&entity, &columns, &columns)
            .hooks(&hooks)
            .build()
            .unwrap();
        assert_eq!(query.filters(), [Filter::eq("id", 1)]);
        assert!(query.selects().is_empty());
    }
}
