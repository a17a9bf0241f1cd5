//! Domain Services
//!
//! - `Differ` - Change detection between listings and the change cache
//! - `sql_template` - Seed template extraction and value binding

mod differ;
pub mod sql_template;

pub use differ::Differ;
pub use sql_template::{
    bind_template, extract_template, lookup, BindError, BindSource, BoundStatement, MissingField,
    SqlValue,
};
