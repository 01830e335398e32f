//! Infrastructure layer: Postgres and in-memory adapters, configuration.

pub mod config;
pub mod inventory_store;

pub use config::AppConfig;
pub use inventory_store::{InMemoryInventoryStore, PostgresInventoryStore};
