//! Postgres-backed inventory store.
//!
//! Reads low-stock candidates and sales history for the alert computation and
//! registers products with their initial stock.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | Result | Scenario |
//! |------------|----------------------|--------|----------|
//! | Database (unique violation) | `23505` | `DomainError::Conflict` | Duplicate SKU on product creation |
//! | Database (other) | Any other | `UpstreamDataError::Query` | Constraint or execution failure |
//! | ColumnDecode / Decode | N/A | `UpstreamDataError::Malformed` | Row does not match the expected shape |
//! | PoolClosed / Other | N/A | `UpstreamDataError::Query` | Network errors, connection failures, etc. |
//!
//! Schema lives in `crates/infra/migrations/`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockalert_core::{
    CompanyId, ContactEmail, DomainError, ProductId, Sku, SupplierId, WarehouseId,
};
use stockalert_inventory::{
    AlertQueryGateway, CatalogError, InventoryCandidate, ProductCatalog, ProductCreated,
    RecentSalesCheck, SalesVelocity, SupplierSummary, UpstreamDataError, ValidatedProduct,
};

const SCHEMA_SQL: &str = include_str!("../../migrations/0001_inventory.sql");

const LOW_STOCK_CANDIDATES_SQL: &str = r#"
    SELECT
        p.id              AS product_id,
        p.name            AS product_name,
        p.sku             AS sku,
        w.id              AS warehouse_id,
        w.name            AS warehouse_name,
        i.quantity        AS quantity,
        i.reorder_threshold AS reorder_threshold,
        s.id              AS supplier_id,
        s.name            AS supplier_name,
        s.contact_email   AS supplier_email
    FROM inventory i
    JOIN products p   ON p.id = i.product_id
    JOIN warehouses w ON w.id = i.warehouse_id
    JOIN suppliers s  ON s.id = p.supplier_id
    WHERE w.company_id = $1
      AND i.quantity <= i.reorder_threshold
    ORDER BY p.id, w.id
"#;

const HAS_RECENT_SALES_SQL: &str = r#"
    SELECT EXISTS (
        SELECT 1
        FROM inventory_history h
        JOIN inventory i ON i.id = h.inventory_id
        WHERE i.product_id = $1
          AND h.reason = 'SALE'
          AND h.changed_at > NOW() - make_interval(days => $2)
    )
"#;

const TOTAL_SOLD_SQL: &str = r#"
    SELECT COALESCE(SUM(ABS(h.change_amount)), 0)::BIGINT
    FROM inventory_history h
    JOIN inventory i ON i.id = h.inventory_id
    WHERE i.product_id = $1
      AND i.warehouse_id = $2
      AND h.reason = 'SALE'
      AND h.changed_at > NOW() - make_interval(days => $3)
"#;

/// Postgres implementation of every inventory collaborator.
///
/// `Send + Sync`; all access goes through the shared SQLx pool.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the inventory schema if it is missing. Safe to run on every start.
    pub async fn ensure_schema(&self) -> Result<(), UpstreamDataError> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl AlertQueryGateway for PostgresInventoryStore {
    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn find_low_stock_candidates(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<InventoryCandidate>, UpstreamDataError> {
        let rows = sqlx::query_as::<_, CandidateRow>(LOW_STOCK_CANDIDATES_SQL)
            .bind(company_id.get())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_low_stock_candidates", e))?;

        rows.into_iter().map(InventoryCandidate::try_from).collect()
    }
}

#[async_trait]
impl RecentSalesCheck for PostgresInventoryStore {
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn has_recent_sales(
        &self,
        product_id: ProductId,
        window_days: u32,
    ) -> Result<bool, UpstreamDataError> {
        sqlx::query_scalar::<_, bool>(HAS_RECENT_SALES_SQL)
            .bind(product_id.get())
            .bind(interval_days(window_days))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("has_recent_sales", e))
    }
}

#[async_trait]
impl SalesVelocity for PostgresInventoryStore {
    #[instrument(
        skip(self),
        fields(product_id = %product_id, warehouse_id = %warehouse_id),
        err
    )]
    async fn average_daily_sales(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        window_days: u32,
    ) -> Result<f64, UpstreamDataError> {
        if window_days == 0 {
            return Ok(0.0);
        }
        let total_sold = sqlx::query_scalar::<_, i64>(TOTAL_SOLD_SQL)
            .bind(product_id.get())
            .bind(warehouse_id.get())
            .bind(interval_days(window_days))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("average_daily_sales", e))?;

        Ok(total_sold as f64 / f64::from(window_days))
    }
}

#[async_trait]
impl ProductCatalog for PostgresInventoryStore {
    #[instrument(skip(self, product), fields(sku = %product.sku), err)]
    async fn create_product(&self, product: ValidatedProduct) -> Result<ProductCreated, CatalogError> {
        // Dropping `tx` without commit rolls back, so early returns leave no rows behind.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let warehouse_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM warehouses WHERE id = $1)")
                .bind(product.warehouse_id.get())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("check_warehouse", e))?;
        if !warehouse_exists {
            return Err(DomainError::not_found(format!("warehouse {}", product.warehouse_id)).into());
        }

        if let Some(supplier_id) = product.supplier_id {
            let supplier_exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM suppliers WHERE id = $1)")
                    .bind(supplier_id.get())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("check_supplier", e))?;
            if !supplier_exists {
                return Err(DomainError::not_found(format!("supplier {supplier_id}")).into());
            }
        }

        let product_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO products (name, sku, price_cents, supplier_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(product.sku.as_str())
        .bind(product.price_cents)
        .bind(product.supplier_id.map(|id| id.get()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| -> CatalogError {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("sku {} already exists", product.sku)).into()
            } else {
                map_sqlx_error("insert_product", e).into()
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, warehouse_id, quantity, reorder_threshold)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(product_id)
        .bind(product.warehouse_id.get())
        .bind(product.initial_quantity)
        .bind(product.reorder_threshold)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_inventory", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let product_id = ProductId::new(product_id)
            .map_err(|e| UpstreamDataError::malformed(e.to_string()))?;
        tracing::info!(%product_id, warehouse_id = %product.warehouse_id, "product created");
        Ok(ProductCreated { product_id })
    }
}

fn interval_days(window_days: u32) -> i32 {
    i32::try_from(window_days).unwrap_or(i32::MAX)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> UpstreamDataError {
    match err {
        sqlx::Error::Database(db_err) => UpstreamDataError::query(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            UpstreamDataError::malformed(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolClosed => {
            UpstreamDataError::query(format!("connection pool closed in {operation}"))
        }
        _ => UpstreamDataError::query(format!("sqlx error in {operation}: {err}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[derive(Debug)]
struct CandidateRow {
    product_id: i64,
    product_name: String,
    sku: String,
    warehouse_id: i64,
    warehouse_name: String,
    quantity: i32,
    reorder_threshold: i32,
    supplier_id: i64,
    supplier_name: String,
    supplier_email: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for CandidateRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CandidateRow {
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            sku: row.try_get("sku")?,
            warehouse_id: row.try_get("warehouse_id")?,
            warehouse_name: row.try_get("warehouse_name")?,
            quantity: row.try_get("quantity")?,
            reorder_threshold: row.try_get("reorder_threshold")?,
            supplier_id: row.try_get("supplier_id")?,
            supplier_name: row.try_get("supplier_name")?,
            supplier_email: row.try_get("supplier_email")?,
        })
    }
}

impl TryFrom<CandidateRow> for InventoryCandidate {
    type Error = UpstreamDataError;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        let malformed = |e: DomainError| {
            UpstreamDataError::malformed(format!("candidate row for product {}: {e}", row.product_id))
        };

        Ok(InventoryCandidate {
            product_id: ProductId::new(row.product_id).map_err(malformed)?,
            product_name: row.product_name.clone(),
            sku: Sku::from_raw(row.sku.clone()),
            warehouse_id: WarehouseId::new(row.warehouse_id).map_err(malformed)?,
            warehouse_name: row.warehouse_name.clone(),
            quantity: row.quantity,
            reorder_threshold: row.reorder_threshold,
            supplier: SupplierSummary {
                id: SupplierId::new(row.supplier_id).map_err(malformed)?,
                name: row.supplier_name.clone(),
                contact_email: ContactEmail::from_raw(row.supplier_email.clone()),
            },
        })
    }
}
