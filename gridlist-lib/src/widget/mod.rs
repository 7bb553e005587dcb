//! The list widget and its request-scoped actions

mod actions;
mod builder;
mod config;
mod list;
mod view;

pub use actions::*;
pub use builder::*;
pub use config::*;
pub use list::*;
pub use view::*;
