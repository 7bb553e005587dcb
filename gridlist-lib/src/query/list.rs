//! The built list query

use std::sync::Arc;

use super::Direction;
use super::Filter;
use super::OrderBy;
use crate::model::EntityDefinition;
use crate::model::Value;

/// A computed column attached to the select list.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedSelect {
    /// Column alias the value is returned under.
    pub alias: String,
    /// The full select expression (a correlated sub-query for relations).
    pub sql: String,
    /// Relation the expression is correlated with.
    pub relation: Option<String>,
    /// Values are aggregated with `group_concat`.
    pub aggregate: bool,
    /// Attribute read by the expression when it is a plain `table.column`.
    pub source: Option<String>,
}

/// A relation count attached to the select list as `{relation}_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationCount {
    pub relation: String,
    pub alias: String,
}

/// A data-fetch query for a list, built but not executed.
///
/// Filters added with [`ListQuery::filter`] are combined with AND.
///
/// # Example
///
/// ```
/// use gridlist_lib::model::EntityDefinition;
/// use gridlist_lib::query::{Filter, ListQuery, OrderBy};
///
/// let mut query = ListQuery::new(EntityDefinition::new("Movie", "movies"));
/// query.filter(Filter::eq("published", true));
/// query.order_by(OrderBy::desc("year"));
/// assert_eq!(query.filters().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub(crate) entity: Arc<EntityDefinition>,
    pub(crate) eager: Vec<String>,
    pub(crate) counts: Vec<RelationCount>,
    pub(crate) filters: Vec<Filter>,
    pub(crate) order: Option<OrderBy>,
    pub(crate) selects: Vec<ComputedSelect>,
    pub(crate) select_bindings: Vec<Value>,
}

impl ListQuery {
    /// Creates the base query for an entity.
    pub fn new(entity: impl Into<Arc<EntityDefinition>>) -> Self {
        Self {
            entity: entity.into(),
            eager: Vec::new(),
            counts: Vec::new(),
            filters: Vec::new(),
            order: None,
            selects: Vec::new(),
            select_bindings: Vec::new(),
        }
    }

    /// The queried entity.
    pub fn entity(&self) -> &EntityDefinition {
        &self.entity
    }

    /// Shared handle to the queried entity.
    pub fn entity_arc(&self) -> Arc<EntityDefinition> {
        Arc::clone(&self.entity)
    }

    /// Adds a condition.
    pub fn filter(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Eager loads a relation. Duplicates are ignored.
    pub fn with(&mut self, relation: impl Into<String>) -> &mut Self {
        let relation = relation.into();
        if !self.eager.contains(&relation) {
            self.eager.push(relation);
        }
        self
    }

    /// Selects the size of a relation as `{relation}_count`.
    pub fn with_count(&mut self, relation: impl Into<String>) -> &mut Self {
        let relation = relation.into();
        if !self.counts.iter().any(|c| c.relation == relation) {
            let alias = format!("{}_count", crate::util::snake_case(&relation));
            self.counts.push(RelationCount { relation, alias });
        }
        self
    }

    /// Adds an ordering field after any existing ones.
    pub fn order_by_field(&mut self, field: impl Into<String>, direction: Direction) -> &mut Self {
        match self.order.as_mut() {
            Some(order) => order.fields.push((field.into(), direction)),
            None => self.order = Some(OrderBy::new(field, direction)),
        }
        self
    }

    /// Replaces the ordering.
    pub fn order_by(&mut self, order: OrderBy) -> &mut Self {
        self.order = Some(order);
        self
    }

    /// Adds computed selects.
    pub fn add_selects(&mut self, selects: impl IntoIterator<Item = ComputedSelect>) -> &mut Self {
        self.selects.extend(selects);
        self
    }

    /// Adds values bound by the computed selects.
    pub fn add_select_bindings(&mut self, bindings: impl IntoIterator<Item = Value>) -> &mut Self {
        self.select_bindings.extend(bindings);
        self
    }

    /// Eager loaded relations.
    pub fn eager_loads(&self) -> &[String] {
        &self.eager
    }

    /// Relation counts.
    pub fn counts(&self) -> &[RelationCount] {
        &self.counts
    }

    /// Conditions, combined with AND.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// The ordering, if any.
    pub fn order(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    /// Computed selects.
    pub fn selects(&self) -> &[ComputedSelect] {
        &self.selects
    }

    /// Bindings of the computed selects, in placeholder order.
    pub fn select_bindings(&self) -> &[Value] {
        &self.select_bindings
    }
}
