//! Inventory data adapters.
//!
//! Each store implements every collaborator the alert computation and the
//! product catalog need (`AlertQueryGateway`, `RecentSalesCheck`,
//! `SalesVelocity`, `ProductCatalog`) over one backing storage.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
