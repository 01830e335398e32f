use serde::{Deserialize, Serialize};

use stockalert_core::ProductId;
use stockalert_inventory::{LowStockAlert, NewProduct};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /api/products`. Every field is optional at the wire level so
/// absent fields can be reported together instead of as a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub warehouse_id: Option<i64>,
    pub initial_quantity: Option<i64>,
    pub reorder_threshold: Option<i64>,
    pub supplier_id: Option<i64>,
}

impl CreateProductRequest {
    /// Returns the names of missing required fields on failure.
    pub fn into_new_product(self) -> Result<NewProduct, Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.sku.is_none() {
            missing.push("sku");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if self.warehouse_id.is_none() {
            missing.push("warehouse_id");
        }
        if self.initial_quantity.is_none() {
            missing.push("initial_quantity");
        }

        match (
            self.name,
            self.sku,
            self.price,
            self.warehouse_id,
            self.initial_quantity,
        ) {
            (Some(name), Some(sku), Some(price), Some(warehouse_id), Some(initial_quantity)) => {
                Ok(NewProduct {
                    name,
                    sku,
                    price,
                    warehouse_id,
                    initial_quantity,
                    reorder_threshold: self.reorder_threshold,
                    supplier_id: self.supplier_id,
                })
            }
            _ => Err(missing),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct LowStockAlertsResponse {
    pub alerts: Vec<LowStockAlert>,
    pub total_alerts: usize,
}

impl From<Vec<LowStockAlert>> for LowStockAlertsResponse {
    fn from(alerts: Vec<LowStockAlert>) -> Self {
        Self {
            total_alerts: alerts.len(),
            alerts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductCreatedResponse {
    pub message: &'static str,
    pub product_id: ProductId,
}

impl ProductCreatedResponse {
    pub fn new(product_id: ProductId) -> Self {
        Self {
            message: "Product created",
            product_id,
        }
    }
}
