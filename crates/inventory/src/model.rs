use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockalert_core::{ContactEmail, InventoryId, ProductId, Sku, SupplierId, WarehouseId};

/// A low-stock row produced by the alert query gateway.
///
/// Already scoped to one company and already at or below its reorder
/// threshold. Snapshot for a single query; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryCandidate {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Sku,
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub quantity: i32,
    pub reorder_threshold: i32,
    pub supplier: SupplierSummary,
}

/// Supplier attributes carried on candidates and alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub id: SupplierId,
    pub name: String,
    pub contact_email: ContactEmail,
}

/// One low-stock alert returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Sku,
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub current_stock: i32,
    pub threshold: i32,
    /// Projected days until the record reaches zero; `NO_VELOCITY_DAYS` when unknown.
    pub days_until_stockout: i32,
    pub supplier: SupplierSummary,
}

/// Why an inventory quantity changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryReason {
    Sale,
    Restock,
    Adjustment,
    Return,
}

impl HistoryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryReason::Sale => "SALE",
            HistoryReason::Restock => "RESTOCK",
            HistoryReason::Adjustment => "ADJUSTMENT",
            HistoryReason::Return => "RETURN",
        }
    }
}

impl core::str::FromStr for HistoryReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALE" => Ok(HistoryReason::Sale),
            "RESTOCK" => Ok(HistoryReason::Restock),
            "ADJUSTMENT" => Ok(HistoryReason::Adjustment),
            "RETURN" => Ok(HistoryReason::Return),
            other => Err(format!("unknown history reason: {other}")),
        }
    }
}

/// A single quantity change recorded against an inventory record.
///
/// Sales are recorded with a negative `change_amount`; velocity uses the
/// absolute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryHistoryEntry {
    pub inventory_id: InventoryId,
    pub change_amount: i32,
    pub reason: HistoryReason,
    pub changed_at: DateTime<Utc>,
}
