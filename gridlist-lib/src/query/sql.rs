//! Parameterised SQL rendering of list queries

use super::Filter;
use super::ListQuery;
use crate::error::QueryError;
use crate::model::EntityDefinition;
use crate::model::Value;

/// A SQL statement with `?` placeholders and their values in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl ListQuery {
    /// Renders the select statement. Eager loads are not part of the
    /// statement; they are fetched separately by the executor.
    ///
    /// # Example
    ///
    /// ```
    /// use gridlist_lib::model::EntityDefinition;
    /// use gridlist_lib::query::{Filter, ListQuery, OrderBy};
    ///
    /// let mut query = ListQuery::new(EntityDefinition::new("Movie", "movies"));
    /// query.filter(Filter::eq("year", 1979)).order_by(OrderBy::asc("title"));
    ///
    /// let statement = query.to_sql(Some(20), 40).unwrap();
    /// assert_eq!(
    ///     statement.sql,
    ///     "select movies.* from movies where year = ? order by title asc limit 20 offset 40"
    /// );
    /// ```
    pub fn to_sql(&self, limit: Option<usize>, offset: usize) -> Result<SqlStatement, QueryError> {
        let entity = self.entity();
        let mut bindings = Vec::new();

        let mut columns = vec![format!("{}.*", entity.table)];
        for count in &self.counts {
            let relation = entity
                .relation(&count.relation)
                .ok_or_else(|| unknown_relation(entity, &count.relation))?;
            let correlation = relation
                .correlate(&count.relation, entity)
                .map_err(|e| QueryError::Unsupported(e.to_string()))?;
            columns.push(format!(
                "(select count(*) from {} where {}) as {}",
                correlation.from,
                correlation.constraint,
                quote(&count.alias)
            ));
            bindings.extend(correlation.bindings);
        }
        for select in &self.selects {
            columns.push(format!("{} as {}", select.sql, quote(&select.alias)));
        }
        bindings.extend(self.select_bindings.iter().cloned());

        let mut sql = format!("select {} from {}", columns.join(", "), entity.table);
        self.push_where(&mut sql, &mut bindings)?;

        if let Some(order) = &self.order {
            let fields: Vec<String> = order
                .fields()
                .iter()
                .map(|(field, direction)| format!("{field} {direction}"))
                .collect();
            if !fields.is_empty() {
                sql.push_str(" order by ");
                sql.push_str(&fields.join(", "));
            }
        }

        if let Some(limit) = limit {
            sql.push_str(&format!(" limit {limit} offset {offset}"));
        } else if offset > 0 {
            sql.push_str(&format!(" limit -1 offset {offset}"));
        }

        Ok(SqlStatement { sql, bindings })
    }

    /// Renders the total count statement.
    pub fn to_count_sql(&self) -> Result<SqlStatement, QueryError> {
        let mut bindings = Vec::new();
        let mut sql = format!("select count(*) as aggregate from {}", self.entity().table);
        self.push_where(&mut sql, &mut bindings)?;
        Ok(SqlStatement { sql, bindings })
    }

    fn push_where(&self, sql: &mut String, bindings: &mut Vec<Value>) -> Result<(), QueryError> {
        if self.filters.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            clauses.push(render(filter, Some(self.entity()), bindings)?);
        }
        sql.push_str(" where ");
        sql.push_str(&clauses.join(" and "));
        Ok(())
    }
}

/// Renders a filter. `entity` is the context for relation sub-queries; inside
/// a sub-query it is `None` and nested relations are not supported.
fn render(
    filter: &Filter,
    entity: Option<&EntityDefinition>,
    bindings: &mut Vec<Value>,
) -> Result<String, QueryError> {
    let sql = match filter {
        Filter::Eq(field, value) => compare(field, "=", value, bindings),
        Filter::Ne(field, value) => compare(field, "<>", value, bindings),
        Filter::Gt(field, value) => compare(field, ">", value, bindings),
        Filter::Ge(field, value) => compare(field, ">=", value, bindings),
        Filter::Lt(field, value) => compare(field, "<", value, bindings),
        Filter::Le(field, value) => compare(field, "<=", value, bindings),
        Filter::In(field, values) => {
            if values.is_empty() {
                "0 = 1".to_string()
            } else {
                bindings.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{field} in ({placeholders})")
            }
        }
        Filter::Contains(field, value) => {
            bindings.push(Value::String(format!("%{value}%")));
            format!("{} like ?", field.to_sql())
        }
        Filter::IsNull(field) => format!("{field} is null"),
        Filter::IsNotNull(field) => format!("{field} is not null"),
        Filter::And(filters) => join(filters, " and ", "1 = 1", entity, bindings)?,
        Filter::Or(filters) => join(filters, " or ", "0 = 1", entity, bindings)?,
        Filter::Not(inner) => format!("not {}", render(inner, entity, bindings)?),
        Filter::Exists(name, inner) => {
            let Some(entity) = entity else {
                return Err(QueryError::Unsupported(format!(
                    "nested relation condition on '{name}'"
                )));
            };
            let relation = entity
                .relation(name)
                .ok_or_else(|| unknown_relation(entity, name))?;
            let correlation = relation
                .correlate(name, entity)
                .map_err(|e| QueryError::Unsupported(e.to_string()))?;
            bindings.extend(correlation.bindings);
            let inner = render(inner, None, bindings)?;
            format!(
                "exists (select * from {} where {} and {})",
                correlation.from, correlation.constraint, inner
            )
        }
        Filter::Raw(sql, values) => {
            bindings.extend(values.iter().cloned());
            format!("({sql})")
        }
    };
    Ok(sql)
}

fn compare(field: &str, op: &str, value: &Value, bindings: &mut Vec<Value>) -> String {
    bindings.push(value.clone());
    format!("{field} {op} ?")
}

fn join(
    filters: &[Filter],
    separator: &str,
    empty: &str,
    entity: Option<&EntityDefinition>,
    bindings: &mut Vec<Value>,
) -> Result<String, QueryError> {
    if filters.is_empty() {
        return Ok(empty.to_string());
    }
    let mut parts = Vec::with_capacity(filters.len());
    for filter in filters {
        parts.push(render(filter, entity, bindings)?);
    }
    Ok(format!("({})", parts.join(separator)))
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn unknown_relation(entity: &EntityDefinition, relation: &str) -> QueryError {
    QueryError::Unsupported(format!(
        "relation '{relation}' is not defined on '{}'",
        entity.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationDefinition;
    use crate::query::ComputedSelect;
    use crate::query::Field;

    fn query() -> ListQuery {
        ListQuery::new(
            EntityDefinition::new("Movie", "movies")
                .with_relation(
                    "genres",
                    RelationDefinition::belongs_to_many("Genre", "genres", "movies_genres"),
                )
                .with_relation(
                    "comments",
                    RelationDefinition::morph_many("Comment", "comments", "commentable"),
                ),
        )
    }

    #[test]
    fn test_search_group_with_exists() {
        let mut query = query();
        query.filter(Filter::or([
            Filter::and([Filter::or([Filter::contains(Field::text("movies", "title"), "alien")])]),
            Filter::exists(
                "genres",
                Filter::and([Filter::or([Filter::contains(Field::column("genres", "title"), "alien")])]),
            ),
        ]));

        let statement = query.to_count_sql().unwrap();
        assert_eq!(
            statement.sql,
            "select count(*) as aggregate from movies where (((CAST(movies.title AS TEXT) like ?)) or \
             exists (select * from genres inner join movies_genres on genres.id = movies_genres.genre_id \
             where movies_genres.movie_id = movies.id and ((genres.title like ?))))"
        );
        assert_eq!(
            statement.bindings,
            vec![Value::from("%alien%"), Value::from("%alien%")]
        );
    }

    #[test]
    fn test_counts_and_selects_bind_first() {
        let mut query = query();
        query.with_count("comments");
        query.add_selects([ComputedSelect {
            alias: "label".to_string(),
            sql: "upper(movies.title)".to_string(),
            relation: None,
            aggregate: false,
            source: None,
        }]);
        query.filter(Filter::eq("published", true));

        let statement = query.to_sql(None, 0).unwrap();
        assert!(statement.sql.contains("as \"comments_count\""));
        assert!(statement.sql.contains("upper(movies.title) as \"label\""));
        assert_eq!(
            statement.bindings,
            vec![Value::from("Movie"), Value::from(true)]
        );
    }

    #[test]
    fn test_nested_exists_is_unsupported() {
        let mut query = query();
        query.filter(Filter::exists("genres", Filter::exists("movies", Filter::eq("id", 1))));
        assert!(matches!(query.to_sql(None, 0), Err(QueryError::Unsupported(_))));
    }

    #[test]
    fn test_empty_in() {
        let mut query = query();
        query.filter(Filter::is_in("id", Vec::<i64>::new()));
        assert!(query.to_count_sql().unwrap().sql.ends_with("where 0 = 1"));
    }
}
