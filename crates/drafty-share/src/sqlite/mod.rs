//! SQLite persistence backend

mod schema;
mod store;

pub use schema::{SCHEMA_VERSION, check_version, init_schema};
pub use store::SqliteStore;
