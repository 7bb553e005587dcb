//! In-memory query executor

use std::cmp::Ordering;

use log::trace;
use log::warn;

use super::QueryExecutor;
use crate::error::QueryError;
use crate::model::Record;
use crate::model::Value;
use crate::query::ComputedSelect;
use crate::query::Direction;
use crate::query::Filter;
use crate::query::ListQuery;
use crate::util::snake_case;

/// Executes list queries over records held in memory.
///
/// Records are expected to carry every relation a query may touch. Relations
/// the query does not eager load are removed from the returned rows, except
/// the `pivot` relation. Raw SQL filters are rejected.
///
/// # Example
///
/// ```
/// use gridlist_lib::executor::{MemoryExecutor, QueryExecutor};
/// use gridlist_lib::model::{EntityDefinition, Record};
/// use gridlist_lib::query::{Filter, ListQuery};
///
/// let executor = MemoryExecutor::new(vec![
///     Record::new("Movie").set("id", 1i64).set("year", 1979i64),
///     Record::new("Movie").set("id", 2i64).set("year", 1986i64),
/// ]);
/// let mut query = ListQuery::new(EntityDefinition::new("Movie", "movies"));
/// query.filter(Filter::gt("year", 1980i64));
/// assert_eq!(executor.count(&query).unwrap(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    records: Vec<Record>,
}

impl MemoryExecutor {
    /// Creates an executor over the given records.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// The stored records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Replaces the stored records.
    pub fn set_records(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    fn matching(&self, query: &ListQuery) -> Result<Vec<Record>, QueryError> {
        let mut rows = Vec::new();
        for record in &self.records {
            let mut record = record.clone();
            apply_counts(&mut record, query);
            apply_selects(&mut record, query.selects());

            let mut keep = true;
            for filter in query.filters() {
                if !matches(&record, filter)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                rows.push(record);
            }
        }
        Ok(rows)
    }
}

impl QueryExecutor for MemoryExecutor {
    fn count(&self, query: &ListQuery) -> Result<usize, QueryError> {
        Ok(self.matching(query)?.len())
    }

    fn get(
        &self,
        query: &ListQuery,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Record>, QueryError> {
        let mut rows = self.matching(query)?;

        if let Some(order) = query.order() {
            rows.sort_by(|a, b| {
                for (field, direction) in order.fields() {
                    let ordering = sort_value(a, field).compare(&sort_value(b, field));
                    let ordering = match direction {
                        Direction::Asc => ordering,
                        Direction::Desc => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let eager = query.eager_loads();
        let rows: Vec<Record> = rows
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(|mut record| {
                record.retain_relations(|name| name == "pivot" || eager.iter().any(|e| e == name));
                record
            })
            .collect();

        trace!(
            "Memory executor returned {} rows for '{}'",
            rows.len(),
            query.entity().name
        );
        Ok(rows)
    }
}

fn apply_counts(record: &mut Record, query: &ListQuery) {
    for count in query.counts() {
        let size = match record.relation(&count.relation) {
            Some(Value::Records(items)) => items.len(),
            Some(Value::Record(_)) => 1,
            _ => 0,
        };
        record.insert(count.alias.clone(), size as i64);
    }
}

fn apply_selects(record: &mut Record, selects: &[ComputedSelect]) {
    for select in selects {
        let Some(source) = &select.source else {
            continue;
        };
        let value = match &select.relation {
            None => record.get(source).cloned().unwrap_or_default(),
            Some(relation) => {
                let values: Vec<Value> = match record.relation(relation) {
                    Some(Value::Records(items)) => items
                        .iter()
                        .filter_map(|item| item.get(source).cloned())
                        .filter(|value| !value.is_null())
                        .collect(),
                    Some(Value::Record(item)) => item.get(source).cloned().into_iter().collect(),
                    _ => Vec::new(),
                };
                if select.aggregate {
                    if values.is_empty() {
                        Value::Null
                    } else {
                        Value::String(
                            values
                                .iter()
                                .map(Value::to_text)
                                .collect::<Vec<_>>()
                                .join(", "),
                        )
                    }
                } else {
                    values.into_iter().next().unwrap_or_default()
                }
            }
        };
        record.insert(select.alias.clone(), value);
    }
}

/// Reads a filter or sort field, accepting `table.column` forms.
fn field_value(record: &Record, field: &str) -> Value {
    if let Some(value) = record.get(field) {
        return value.clone();
    }
    match field.rsplit_once('.') {
        Some((_, column)) => record.get(column).cloned().unwrap_or_default(),
        None => Value::Null,
    }
}

fn sort_value(record: &Record, field: &str) -> Value {
    if let Some(column) = field.strip_prefix("pivot_")
        && let Some(Value::Record(pivot)) = record.relation("pivot")
    {
        return pivot.value_at(&crate::util::name_to_array(column));
    }
    if record.contains(field) {
        return field_value(record, field);
    }
    if let Some(relation) = field.strip_suffix("_count")
        && let Some(Value::Records(items)) = record
            .relation(relation)
            .or_else(|| record.relation(&snake_case(relation)))
    {
        return Value::Int(items.len() as i64);
    }
    record.value_at(&crate::util::name_to_array(field))
}

fn compare(record: &Record, field: &str, value: &Value, accept: fn(Ordering) -> bool) -> bool {
    let current = field_value(record, field);
    if current.is_null() || value.is_null() {
        return false;
    }
    accept(current.compare(value))
}

fn matches(record: &Record, filter: &Filter) -> Result<bool, QueryError> {
    let result = match filter {
        Filter::Eq(field, value) => compare(record, field, value, Ordering::is_eq),
        Filter::Ne(field, value) => compare(record, field, value, Ordering::is_ne),
        Filter::Gt(field, value) => compare(record, field, value, Ordering::is_gt),
        Filter::Ge(field, value) => compare(record, field, value, Ordering::is_ge),
        Filter::Lt(field, value) => compare(record, field, value, Ordering::is_lt),
        Filter::Le(field, value) => compare(record, field, value, Ordering::is_le),
        Filter::In(field, values) => values
            .iter()
            .any(|value| compare(record, field, value, Ordering::is_eq)),
        Filter::Contains(field, needle) => {
            let haystack = field_value(record, field.attribute());
            !haystack.is_null()
                && haystack
                    .to_text()
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
        }
        Filter::IsNull(field) => field_value(record, field).is_null(),
        Filter::IsNotNull(field) => !field_value(record, field).is_null(),
        Filter::And(filters) => {
            for filter in filters {
                if !matches(record, filter)? {
                    return Ok(false);
                }
            }
            true
        }
        Filter::Or(filters) => {
            for filter in filters {
                if matches(record, filter)? {
                    return Ok(true);
                }
            }
            false
        }
        Filter::Not(inner) => !matches(record, inner)?,
        Filter::Exists(relation, inner) => match record.relation(relation) {
            Some(Value::Records(items)) => {
                let mut found = false;
                for item in items {
                    if matches(item, inner)? {
                        found = true;
                        break;
                    }
                }
                found
            }
            Some(Value::Record(item)) => matches(item, inner)?,
            Some(_) => false,
            None => {
                warn!(
                    "Relation '{}' is not loaded on '{}' records; treating as empty",
                    relation,
                    record.entity_name()
                );
                false
            }
        },
        Filter::Raw(sql, _) => {
            return Err(QueryError::Unsupported(format!(
                "raw condition '{sql}' cannot be evaluated in memory"
            )));
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityDefinition;
    use crate::model::RelationDefinition;
    use crate::query::Field;
    use crate::query::OrderBy;

    fn genre(title: &str) -> Record {
        Record::new("Genre").set("title", title)
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new("Movie")
                .set("id", 1i64)
                .set("title", "Alien")
                .set("year", 1979i64)
                .with_relation("genres", vec![genre("Horror"), genre("Sci-Fi")]),
            Record::new("Movie")
                .set("id", 2i64)
                .set("title", "Aliens")
                .set("year", 1986i64)
                .with_relation("genres", vec![genre("Action")]),
            Record::new("Movie")
                .set("id", 3i64)
                .set("title", "Heat")
                .set("year", 1995i64)
                .with_relation("genres", Vec::<Record>::new()),
        ]
    }

    fn query() -> ListQuery {
        ListQuery::new(EntityDefinition::new("Movie", "movies").with_relation(
            "genres",
            RelationDefinition::belongs_to_many("Genre", "genres", "movies_genres"),
        ))
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let executor = MemoryExecutor::new(records());
        let mut query = query();
        query.filter(Filter::contains(Field::text("movies", "title"), "ALIEN"));
        assert_eq!(executor.count(&query).unwrap(), 2);
    }

    #[test]
    fn test_exists_over_relation() {
        let executor = MemoryExecutor::new(records());
        let mut query = query();
        query.filter(Filter::exists(
            "genres",
            Filter::contains(Field::column("genres", "title"), "horror"),
        ));
        let rows = executor.get(&query, None, 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_order_limit_offset_and_eager() {
        let executor = MemoryExecutor::new(records());
        let mut query = query();
        query.order_by(OrderBy::desc("year"));
        let rows = executor.get(&query, Some(2), 1).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("year"), Some(&Value::Int(1986)));
        assert!(!rows[0].has_relation("genres"));

        query.with("genres");
        let rows = executor.get(&query, Some(1), 0).unwrap();
        assert!(rows[0].has_relation("genres"));
    }

    #[test]
    fn test_counts_and_aggregate_selects() {
        let executor = MemoryExecutor::new(records());
        let mut query = query();
        query.with_count("genres");
        query.add_selects([ComputedSelect {
            alias: "genre_list".to_string(),
            sql: String::new(),
            relation: Some("genres".to_string()),
            aggregate: true,
            source: Some("title".to_string()),
        }]);
        query.order_by(OrderBy::desc("genres_count"));

        let rows = executor.get(&query, None, 0).unwrap();
        assert_eq!(rows[0].get("genres_count"), Some(&Value::Int(2)));
        assert_eq!(rows[0].get("genre_list"), Some(&Value::from("Horror, Sci-Fi")));
        assert_eq!(rows[2].get("genre_list"), Some(&Value::Null));
    }

    #[test]
    fn test_raw_filter_is_rejected() {
        let executor = MemoryExecutor::new(records());
        let mut query = query();
        query.filter(Filter::raw("year > 1980", Vec::new()));
        assert!(matches!(executor.count(&query), Err(QueryError::Unsupported(_))));
    }
}
