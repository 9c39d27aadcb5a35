//! Read-only query engine over a single on-disk SQLite database file.
//!
//! Layers mirror SQLite's own architecture: a [`pager`] serves raw pages
//! from disk, [`btree`] walks table and index B-trees built on those pages,
//! [`record`] and [`serial_type`] decode the row format stored in B-tree
//! cells, [`schema`] resolves `sqlite_schema`, and [`executor`] composes all
//! of the above to answer a parsed [`sqlparser::Command`].

pub mod btree;
pub mod create_sql;
pub mod dbheader;
pub mod executor;
pub mod pager;
pub mod record;
pub mod schema;
pub mod serial_type;
pub mod sql_value;
pub mod sqlparser;
pub mod varint;

pub use executor::{run, QueryOutput};
pub use sql_value::SqlValue;
