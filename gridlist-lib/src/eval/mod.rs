//! Cell value evaluation and column type transforms

mod datetime;
mod evaluator;
mod text;
mod types;

pub use datetime::*;
pub use evaluator::*;
pub use text::*;
pub use types::*;
