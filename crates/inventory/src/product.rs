use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockalert_core::{DomainError, DomainResult, ProductId, Sku, SupplierId, WarehouseId};

use crate::ports::UpstreamDataError;

/// Reorder threshold applied when a product is created without one.
pub const DEFAULT_REORDER_THRESHOLD: i32 = 10;

/// Request to register a product together with its initial stock in one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    /// Unit price in currency units (e.g. `12.50`).
    pub price: f64,
    pub warehouse_id: i64,
    pub initial_quantity: i64,
    pub reorder_threshold: Option<i64>,
    /// Supplier to reorder from; products without one never show up in alerts.
    pub supplier_id: Option<i64>,
}

/// A `NewProduct` that passed validation; the only input catalogs accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProduct {
    pub name: String,
    pub sku: Sku,
    /// Unit price in the smallest currency unit (cents).
    pub price_cents: i64,
    pub warehouse_id: WarehouseId,
    pub initial_quantity: i32,
    pub reorder_threshold: i32,
    pub supplier_id: Option<SupplierId>,
}

/// Result of a successful product registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Upstream(#[from] UpstreamDataError),
}

impl NewProduct {
    pub fn validate(self) -> DomainResult<ValidatedProduct> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let sku = Sku::parse(&self.sku)?;

        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::validation("price must be a non-negative number"));
        }
        let cents = (self.price * 100.0).round();
        if cents > i64::MAX as f64 {
            return Err(DomainError::validation("price is too large"));
        }

        let warehouse_id = WarehouseId::new(self.warehouse_id)?;
        let initial_quantity = non_negative_i32("initial_quantity", self.initial_quantity)?;
        let reorder_threshold = match self.reorder_threshold {
            Some(t) => non_negative_i32("reorder_threshold", t)?,
            None => DEFAULT_REORDER_THRESHOLD,
        };
        let supplier_id = self.supplier_id.map(SupplierId::new).transpose()?;

        Ok(ValidatedProduct {
            name: name.to_string(),
            sku,
            price_cents: cents as i64,
            warehouse_id,
            initial_quantity,
            reorder_threshold,
            supplier_id,
        })
    }
}

fn non_negative_i32(field: &str, value: i64) -> DomainResult<i32> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    i32::try_from(value).map_err(|_| DomainError::validation(format!("{field} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            sku: "WID-001".to_string(),
            price: 12.5,
            warehouse_id: 3,
            initial_quantity: 40,
            reorder_threshold: None,
            supplier_id: Some(8),
        }
    }

    #[test]
    fn valid_product_gets_default_threshold_and_cents() {
        let v = widget().validate().unwrap();
        assert_eq!(v.price_cents, 1250);
        assert_eq!(v.reorder_threshold, DEFAULT_REORDER_THRESHOLD);
        assert_eq!(v.warehouse_id.get(), 3);
        assert_eq!(v.sku.as_str(), "WID-001");
        assert_eq!(v.supplier_id, Some(SupplierId::from_raw(8)));
    }

    #[test]
    fn blank_name_is_rejected() {
        let p = NewProduct { name: "  ".into(), ..widget() };
        assert_eq!(p.validate(), Err(DomainError::validation("name cannot be empty")));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let p = NewProduct { initial_quantity: -1, ..widget() };
        match p.validate() {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("initial_quantity")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn quantity_beyond_i32_is_rejected() {
        let p = NewProduct { initial_quantity: i64::from(i32::MAX) + 1, ..widget() };
        assert!(matches!(p.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn nan_price_is_rejected() {
        let p = NewProduct { price: f64::NAN, ..widget() };
        assert!(matches!(p.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn non_positive_warehouse_is_an_invalid_id() {
        let p = NewProduct { warehouse_id: 0, ..widget() };
        assert!(matches!(p.validate(), Err(DomainError::InvalidId(_))));
    }
}
