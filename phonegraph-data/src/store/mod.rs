//! SQLite-backed graph store.
//!
//! The module is split into two focused submodules:
//! - [`schema`] materialises the entity and relationship tables.
//! - [`sqlite`] implements the session and transaction traits over them.
#![forbid(unsafe_code)]

mod schema;
mod sqlite;

pub use schema::{SCHEMA_VERSION, SchemaError, initialise_schema};
pub use sqlite::{OpenStoreError, SqliteSession, SqliteTransaction};
