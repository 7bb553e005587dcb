//! Query execution

mod memory;

pub use memory::*;

use crate::error::QueryError;
use crate::model::Record;
use crate::query::ListQuery;

/// Runs built list queries against a data source.
pub trait QueryExecutor {
    /// Number of records matching the query's filters.
    fn count(&self, query: &ListQuery) -> Result<usize, QueryError>;

    /// Matching records in query order, with eager loads, counts and computed
    /// selects applied. `limit` of `None` fetches everything after `offset`.
    fn get(
        &self,
        query: &ListQuery,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Record>, QueryError>;
}
