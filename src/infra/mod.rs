//! Infrastructure adapters: persistence backends and the Postgres schema.

pub mod postgres;
pub mod store;

pub use postgres::PostgresSchema;
pub use store::{DispatchStore, InMemoryStore, JournalStore};
