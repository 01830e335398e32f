//! Collaborator traits the alert computation depends on.
//!
//! Each capability is a one-method trait so a data-backed implementation can
//! replace a stub without touching the computer. All of them are `Send + Sync`
//! so a computer can be shared across request handlers.

use async_trait::async_trait;
use thiserror::Error;

use stockalert_core::{CompanyId, ProductId, WarehouseId};

use crate::model::InventoryCandidate;
use crate::product::{CatalogError, ProductCreated, ValidatedProduct};

/// Failure of an upstream data source (query execution or row mapping).
///
/// The alert computation never catches these; they reach the caller as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamDataError {
    #[error("data access failed: {0}")]
    Query(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

impl UpstreamDataError {
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Source of low-stock candidates for a company.
#[async_trait]
pub trait AlertQueryGateway: Send + Sync {
    /// Inventory rows of `company_id` with `quantity <= reorder_threshold`,
    /// joined with product, warehouse and supplier attributes.
    ///
    /// The returned order is stable for identical data.
    async fn find_low_stock_candidates(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<InventoryCandidate>, UpstreamDataError>;
}

/// Whether a product sold anything recently.
#[async_trait]
pub trait RecentSalesCheck: Send + Sync {
    /// `true` iff at least one sale was recorded for `product_id` within the
    /// trailing `window_days` days.
    async fn has_recent_sales(
        &self,
        product_id: ProductId,
        window_days: u32,
    ) -> Result<bool, UpstreamDataError>;
}

/// Sales velocity of one inventory record.
#[async_trait]
pub trait SalesVelocity: Send + Sync {
    /// Mean units sold per day for `product_id` in `warehouse_id` over the
    /// trailing `window_days` days. `0.0` without sales history.
    async fn average_daily_sales(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        window_days: u32,
    ) -> Result<f64, UpstreamDataError>;
}

/// Product registration with its initial stock.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Persist the product and its inventory record atomically.
    async fn create_product(&self, product: ValidatedProduct) -> Result<ProductCreated, CatalogError>;
}

/// Recency check that reports every product as recently sold.
///
/// Used for dev wiring when no sales history is available.
#[derive(Debug, Default, Copy, Clone)]
pub struct AlwaysRecentSales;

#[async_trait]
impl RecentSalesCheck for AlwaysRecentSales {
    async fn has_recent_sales(
        &self,
        _product_id: ProductId,
        _window_days: u32,
    ) -> Result<bool, UpstreamDataError> {
        Ok(true)
    }
}

/// Velocity source returning the same rate for every record.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedVelocity(pub f64);

#[async_trait]
impl SalesVelocity for FixedVelocity {
    async fn average_daily_sales(
        &self,
        _product_id: ProductId,
        _warehouse_id: WarehouseId,
        _window_days: u32,
    ) -> Result<f64, UpstreamDataError> {
        Ok(self.0)
    }
}
