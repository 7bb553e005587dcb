//! Pagination of list results

mod page;
mod paginator;

pub use page::*;
pub use paginator::*;
