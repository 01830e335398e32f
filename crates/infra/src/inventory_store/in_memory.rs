use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use stockalert_core::{
    CompanyId, ContactEmail, DomainError, InventoryId, ProductId, Sku, SupplierId, WarehouseId,
};
use stockalert_inventory::{
    AlertQueryGateway, CatalogError, HistoryReason, InventoryCandidate, InventoryHistoryEntry,
    ProductCatalog, ProductCreated, RecentSalesCheck, SalesVelocity, SupplierSummary,
    UpstreamDataError, ValidatedProduct,
};

#[derive(Debug, Clone)]
struct WarehouseRow {
    company_id: CompanyId,
    name: String,
}

#[derive(Debug, Clone)]
struct SupplierRow {
    name: String,
    contact_email: ContactEmail,
}

#[derive(Debug, Clone)]
struct ProductRow {
    name: String,
    sku: Sku,
    price_cents: i64,
    supplier_id: Option<SupplierId>,
}

#[derive(Debug, Clone)]
struct InventoryRow {
    id: InventoryId,
    product_id: ProductId,
    warehouse_id: WarehouseId,
    quantity: i32,
    reorder_threshold: i32,
}

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    warehouses: HashMap<WarehouseId, WarehouseRow>,
    suppliers: HashMap<SupplierId, SupplierRow>,
    products: HashMap<ProductId, ProductRow>,
    /// Insertion order is the gateway's result order.
    inventory: Vec<InventoryRow>,
    /// Position of each row in `inventory`.
    inventory_index: HashMap<InventoryId, usize>,
    history: Vec<InventoryHistoryEntry>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn inventory_row(&self, id: InventoryId) -> Option<&InventoryRow> {
        self.inventory_index.get(&id).and_then(|&i| self.inventory.get(i))
    }

    /// SALE entries for inventory rows accepted by `matches`, newer than `since`.
    fn sales_since<'a>(
        &'a self,
        since: DateTime<Utc>,
        matches: impl Fn(&InventoryRow) -> bool + 'a,
    ) -> impl Iterator<Item = &'a InventoryHistoryEntry> + 'a {
        self.history.iter().filter(move |h| {
            h.reason == HistoryReason::Sale
                && h.changed_at > since
                && self.inventory_row(h.inventory_id).is_some_and(&matches)
        })
    }
}

/// In-memory inventory store for tests/dev.
///
/// Mirrors the relational layout (warehouses, suppliers, products, inventory,
/// inventory history) so query semantics match the Postgres adapter.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, UpstreamDataError> {
        self.inner
            .read()
            .map_err(|_| UpstreamDataError::query("in-memory inventory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, UpstreamDataError> {
        self.inner
            .write()
            .map_err(|_| UpstreamDataError::query("in-memory inventory store lock poisoned"))
    }

    pub fn add_warehouse(
        &self,
        company_id: CompanyId,
        name: impl Into<String>,
    ) -> Result<WarehouseId, UpstreamDataError> {
        let mut t = self.write()?;
        let id = WarehouseId::from_raw(t.next_id());
        t.warehouses.insert(
            id,
            WarehouseRow {
                company_id,
                name: name.into(),
            },
        );
        Ok(id)
    }

    pub fn add_supplier(
        &self,
        name: impl Into<String>,
        contact_email: ContactEmail,
    ) -> Result<SupplierId, UpstreamDataError> {
        let mut t = self.write()?;
        let id = SupplierId::from_raw(t.next_id());
        t.suppliers.insert(
            id,
            SupplierRow {
                name: name.into(),
                contact_email,
            },
        );
        Ok(id)
    }

    /// Apply a quantity change to an inventory record and log it in the history.
    pub fn record_change(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        change_amount: i32,
        reason: HistoryReason,
        changed_at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        let mut t = self.write()?;
        let row = t
            .inventory
            .iter_mut()
            .find(|r| r.product_id == product_id && r.warehouse_id == warehouse_id)
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "no inventory for product {product_id} in warehouse {warehouse_id}"
                ))
            })?;

        let quantity = row
            .quantity
            .checked_add(change_amount)
            .filter(|q| *q >= 0)
            .ok_or_else(|| DomainError::validation("stock cannot go negative"))?;
        row.quantity = quantity;
        let inventory_id = row.id;

        t.history.push(InventoryHistoryEntry {
            inventory_id,
            change_amount,
            reason,
            changed_at,
        });
        Ok(())
    }

    pub fn quantity(&self, product_id: ProductId, warehouse_id: WarehouseId) -> Option<i32> {
        let t = self.read().ok()?;
        t.inventory
            .iter()
            .find(|r| r.product_id == product_id && r.warehouse_id == warehouse_id)
            .map(|r| r.quantity)
    }

    pub fn price_cents(&self, product_id: ProductId) -> Option<i64> {
        let t = self.read().ok()?;
        t.products.get(&product_id).map(|p| p.price_cents)
    }

    pub fn product_count(&self) -> usize {
        self.read().map(|t| t.products.len()).unwrap_or(0)
    }
}

#[async_trait]
impl AlertQueryGateway for InMemoryInventoryStore {
    async fn find_low_stock_candidates(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<InventoryCandidate>, UpstreamDataError> {
        let t = self.read()?;
        let mut candidates = Vec::new();

        for row in &t.inventory {
            if row.quantity > row.reorder_threshold {
                continue;
            }
            let Some(warehouse) = t.warehouses.get(&row.warehouse_id) else {
                continue;
            };
            if warehouse.company_id != company_id {
                continue;
            }
            let Some(product) = t.products.get(&row.product_id) else {
                continue;
            };
            // Inner join on supplier: unsupplied products are not alertable.
            let Some((supplier_id, supplier)) = product
                .supplier_id
                .and_then(|id| t.suppliers.get(&id).map(|s| (id, s)))
            else {
                continue;
            };

            candidates.push(InventoryCandidate {
                product_id: row.product_id,
                product_name: product.name.clone(),
                sku: product.sku.clone(),
                warehouse_id: row.warehouse_id,
                warehouse_name: warehouse.name.clone(),
                quantity: row.quantity,
                reorder_threshold: row.reorder_threshold,
                supplier: SupplierSummary {
                    id: supplier_id,
                    name: supplier.name.clone(),
                    contact_email: supplier.contact_email.clone(),
                },
            });
        }

        Ok(candidates)
    }
}

#[async_trait]
impl RecentSalesCheck for InMemoryInventoryStore {
    async fn has_recent_sales(
        &self,
        product_id: ProductId,
        window_days: u32,
    ) -> Result<bool, UpstreamDataError> {
        let t = self.read()?;
        let since = Utc::now() - Duration::days(i64::from(window_days));
        let found = t
            .sales_since(since, move |r| r.product_id == product_id)
            .next()
            .is_some();
        Ok(found)
    }
}

#[async_trait]
impl SalesVelocity for InMemoryInventoryStore {
    async fn average_daily_sales(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        window_days: u32,
    ) -> Result<f64, UpstreamDataError> {
        if window_days == 0 {
            return Ok(0.0);
        }
        let t = self.read()?;
        let since = Utc::now() - Duration::days(i64::from(window_days));
        let total_sold: i64 = t
            .sales_since(since, move |r| {
                r.product_id == product_id && r.warehouse_id == warehouse_id
            })
            .map(|h| i64::from(h.change_amount).abs())
            .sum();
        Ok(total_sold as f64 / f64::from(window_days))
    }
}

#[async_trait]
impl ProductCatalog for InMemoryInventoryStore {
    async fn create_product(&self, product: ValidatedProduct) -> Result<ProductCreated, CatalogError> {
        // Every check runs before the first insert, under one write lock,
        // so either both rows land or neither does.
        let mut t = self.write()?;

        if !t.warehouses.contains_key(&product.warehouse_id) {
            return Err(DomainError::not_found(format!("warehouse {}", product.warehouse_id)).into());
        }
        if let Some(supplier_id) = product.supplier_id {
            if !t.suppliers.contains_key(&supplier_id) {
                return Err(DomainError::not_found(format!("supplier {supplier_id}")).into());
            }
        }
        if t.products.values().any(|p| p.sku == product.sku) {
            return Err(DomainError::conflict(format!("sku {} already exists", product.sku)).into());
        }

        let product_id = ProductId::from_raw(t.next_id());
        let inventory_id = InventoryId::from_raw(t.next_id());
        t.products.insert(
            product_id,
            ProductRow {
                name: product.name,
                sku: product.sku,
                price_cents: product.price_cents,
                supplier_id: product.supplier_id,
            },
        );
        let position = t.inventory.len();
        t.inventory_index.insert(inventory_id, position);
        t.inventory.push(InventoryRow {
            id: inventory_id,
            product_id,
            warehouse_id: product.warehouse_id,
            quantity: product.initial_quantity,
            reorder_threshold: product.reorder_threshold,
        });

        tracing::info!(%product_id, warehouse_id = %product.warehouse_id, "product created");
        Ok(ProductCreated { product_id })
    }
}
