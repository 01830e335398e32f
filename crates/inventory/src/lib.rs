//! Inventory alerting domain module.
//!
//! This crate contains the low-stock alert computation and the product
//! creation rules, implemented as deterministic domain logic over
//! collaborator traits (no IO, no HTTP, no storage).

pub mod alerts;
pub mod model;
pub mod ports;
pub mod product;

pub use alerts::{AlertWindows, LowStockAlertComputer, NO_VELOCITY_DAYS, project_days_until_stockout};
pub use model::{
    HistoryReason, InventoryCandidate, InventoryHistoryEntry, LowStockAlert, SupplierSummary,
};
pub use ports::{
    AlertQueryGateway, AlwaysRecentSales, FixedVelocity, ProductCatalog, RecentSalesCheck,
    SalesVelocity, UpstreamDataError,
};
pub use product::{CatalogError, NewProduct, ProductCreated, ValidatedProduct};
