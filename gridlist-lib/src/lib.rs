//! Backend list widget pipeline
//!
//! Turns a declarative column configuration and an entity definition into a
//! paginated, sorted, searched and column-transformed result set, with a
//! per-user preference layer for visible columns, column order and page size.

pub mod column;
pub mod error;
pub mod eval;
pub mod executor;
pub mod hooks;
pub mod model;
pub mod pagination;
pub mod query;
pub mod services;
pub mod storage;
pub mod widget;

mod util;

pub use widget::*;
