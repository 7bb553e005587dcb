//! List column definitions

mod config;
mod definition;
mod registry;

pub use config::*;
pub use definition::*;
pub use registry::*;
