//! Filter predicates applied to list queries

use crate::model::Value;

/// A searchable field, as seen by both SQL rendering and in-memory evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// `table.column`
    Column { table: String, column: String },
    /// `CAST(table.column AS TEXT)`
    Text { table: String, column: String },
    /// A raw SQL expression. `column` names the attribute that holds its value
    /// when the expression cannot be evaluated outside a database.
    Expression { sql: String, column: String },
}

impl Field {
    /// Creates a plain qualified column.
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Field::Column {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a column cast to text.
    pub fn text(table: impl Into<String>, column: impl Into<String>) -> Self {
        Field::Text {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a raw expression field.
    pub fn expression(sql: impl Into<String>, column: impl Into<String>) -> Self {
        Field::Expression {
            sql: sql.into(),
            column: column.into(),
        }
    }

    /// The attribute name holding the field's value on a fetched record.
    pub fn attribute(&self) -> &str {
        match self {
            Field::Column { column, .. } | Field::Text { column, .. } => column,
            Field::Expression { column, .. } => column,
        }
    }

    /// The SQL form of the field.
    pub fn to_sql(&self) -> String {
        match self {
            Field::Column { table, column } => format!("{table}.{column}"),
            Field::Text { table, column } => format!("CAST({table}.{column} AS TEXT)"),
            Field::Expression { sql, .. } => sql.clone(),
        }
    }
}

/// A condition on list records.
///
/// Comparison fields are attribute names of the record being filtered. Inside
/// [`Filter::Exists`] they refer to the related records.
///
/// # Example
///
/// ```
/// use gridlist_lib::query::Filter;
///
/// let filter = Filter::eq("published", true)
///     .and_also(Filter::ge("year", 1980))
///     .and_also(Filter::exists("genres", Filter::eq("slug", "horror")));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field = value`
    Eq(String, Value),
    /// `field <> value`
    Ne(String, Value),
    /// `field > value`
    Gt(String, Value),
    /// `field >= value`
    Ge(String, Value),
    /// `field < value`
    Lt(String, Value),
    /// `field <= value`
    Le(String, Value),
    /// `field in (values)`
    In(String, Vec<Value>),
    /// Case-insensitive substring match: `field like %value%`
    Contains(Field, String),
    /// `field is null`
    IsNull(String),
    /// `field is not null`
    IsNotNull(String),
    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Negation.
    Not(Box<Filter>),
    /// At least one related record of the relation matches.
    Exists(String, Box<Filter>),
    /// Raw SQL with bindings (escape hatch, SQL executors only).
    Raw(String, Vec<Value>),
}

impl Filter {
    /// Creates an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Creates a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    /// Creates a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    /// Creates a greater-than-or-equal filter.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ge(field.into(), value.into())
    }

    /// Creates a less-than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    /// Creates a less-than-or-equal filter.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Le(field.into(), value.into())
    }

    /// Creates a membership filter.
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Creates a substring filter.
    pub fn contains(field: Field, value: impl Into<String>) -> Self {
        Filter::Contains(field, value.into())
    }

    /// Creates an is-null filter.
    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::IsNull(field.into())
    }

    /// Creates an is-not-null filter.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Filter::IsNotNull(field.into())
    }

    /// Creates a logical AND of multiple filters.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Creates a logical OR of multiple filters.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Creates an existence filter over a relation.
    pub fn exists(relation: impl Into<String>, filter: Filter) -> Self {
        Filter::Exists(relation.into(), Box::new(filter))
    }

    /// Creates a raw SQL filter.
    pub fn raw(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Filter::Raw(sql.into(), bindings)
    }

    /// Combines this filter with another using logical AND.
    pub fn and_also(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            _ => Filter::And(vec![self, other]),
        }
    }

    /// Combines this filter with another using logical OR.
    pub fn or_else(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            _ => Filter::Or(vec![self, other]),
        }
    }

    /// Negates this filter.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinators_flatten() {
        let filter = Filter::eq("a", 1).and_also(Filter::eq("b", 2)).and_also(Filter::eq("c", 3));
        let Filter::And(filters) = filter else {
            panic!("expected and");
        };
        assert_eq!(filters.len(), 3);

        let filter = Filter::eq("a", 1).or_else(Filter::eq("b", 2)).or_else(Filter::eq("c", 3));
        assert!(matches!(filter, Filter::Or(ref f) if f.len() == 3));
    }

    #[test]
    fn test_field_forms() {
        assert_eq!(Field::column("genres", "title").to_sql(), "genres.title");
        assert_eq!(Field::text("movies", "year").to_sql(), "CAST(movies.year AS TEXT)");
        let expr = Field::expression("concat(movies.a, movies.b)", "full");
        assert_eq!(expr.attribute(), "full");
    }
}
