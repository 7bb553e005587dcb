//! List query construction

mod builder;
mod filter;
mod list;
mod order;
mod search;
mod sql;

pub use builder::*;
pub use filter::*;
pub use list::*;
pub use order::*;
pub use search::*;
pub use sql::*;
