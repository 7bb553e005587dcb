//! Entity and record models

mod entity;
mod record;
mod relation;
mod value;

pub use entity::*;
pub use record::*;
pub use relation::*;
pub use value::*;
