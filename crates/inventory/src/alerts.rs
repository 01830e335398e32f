//! Low-stock alert computation.
//!
//! A single pass over the gateway's candidates:
//! - drop candidates without recent sales
//! - project days until stockout from sales velocity
//! - copy identifying and supplier fields onto the alert
//!
//! Order is the gateway's order; nothing is sorted.

use std::sync::Arc;

use tracing::instrument;

use stockalert_core::{CompanyId, DomainError, DomainResult};

use crate::model::{InventoryCandidate, LowStockAlert};
use crate::ports::{AlertQueryGateway, RecentSalesCheck, SalesVelocity, UpstreamDataError};

/// Days-until-stockout reported when there is no usable sales velocity.
pub const NO_VELOCITY_DAYS: i32 = 999;

/// Default length of both trailing windows, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Trailing windows used by the recency filter and the velocity lookup.
///
/// The two are independent; nothing requires them to match.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AlertWindows {
    pub recent_sales_days: u32,
    pub velocity_days: u32,
}

impl AlertWindows {
    pub fn new(recent_sales_days: u32, velocity_days: u32) -> DomainResult<Self> {
        if recent_sales_days == 0 {
            return Err(DomainError::validation("recent sales window must be at least one day"));
        }
        if velocity_days == 0 {
            return Err(DomainError::validation("velocity window must be at least one day"));
        }
        Ok(Self {
            recent_sales_days,
            velocity_days,
        })
    }
}

impl Default for AlertWindows {
    fn default() -> Self {
        Self {
            recent_sales_days: DEFAULT_WINDOW_DAYS,
            velocity_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Whole days until `quantity` is exhausted at `velocity` units per day.
///
/// Truncates toward zero. A zero, negative or non-finite velocity yields
/// `NO_VELOCITY_DAYS`. Results beyond `i32::MAX` saturate.
pub fn project_days_until_stockout(quantity: i32, velocity: f64) -> i32 {
    if !(velocity.is_finite() && velocity > 0.0) {
        return NO_VELOCITY_DAYS;
    }
    (f64::from(quantity) / velocity).trunc() as i32
}

/// Computes low-stock alerts for a company.
///
/// Stateless apart from its collaborators; share it behind an `Arc`.
#[derive(Clone)]
pub struct LowStockAlertComputer {
    gateway: Arc<dyn AlertQueryGateway>,
    recent_sales: Arc<dyn RecentSalesCheck>,
    velocity: Arc<dyn SalesVelocity>,
    windows: AlertWindows,
}

impl LowStockAlertComputer {
    pub fn new(
        gateway: Arc<dyn AlertQueryGateway>,
        recent_sales: Arc<dyn RecentSalesCheck>,
        velocity: Arc<dyn SalesVelocity>,
        windows: AlertWindows,
    ) -> Self {
        Self {
            gateway,
            recent_sales,
            velocity,
            windows,
        }
    }

    pub fn windows(&self) -> AlertWindows {
        self.windows
    }

    /// Alerts for every low-stock record of `company_id` that sold recently.
    ///
    /// The first collaborator error aborts the computation; no partial
    /// result is returned.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn compute_low_stock_alerts(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<LowStockAlert>, UpstreamDataError> {
        let candidates = self.gateway.find_low_stock_candidates(company_id).await?;
        let candidate_count = candidates.len();
        let mut alerts = Vec::with_capacity(candidate_count);

        for candidate in candidates {
            let recent = self
                .recent_sales
                .has_recent_sales(candidate.product_id, self.windows.recent_sales_days)
                .await?;
            if !recent {
                tracing::debug!(
                    product_id = %candidate.product_id,
                    warehouse_id = %candidate.warehouse_id,
                    "no recent sales; skipping"
                );
                continue;
            }

            let velocity = self
                .velocity
                .average_daily_sales(
                    candidate.product_id,
                    candidate.warehouse_id,
                    self.windows.velocity_days,
                )
                .await?;
            let days = project_days_until_stockout(candidate.quantity, velocity);

            alerts.push(to_alert(candidate, days));
        }

        tracing::info!(
            candidates = candidate_count,
            alerts = alerts.len(),
            "low-stock alerts computed"
        );
        Ok(alerts)
    }
}

fn to_alert(candidate: InventoryCandidate, days_until_stockout: i32) -> LowStockAlert {
    LowStockAlert {
        product_id: candidate.product_id,
        product_name: candidate.product_name,
        sku: candidate.sku,
        warehouse_id: candidate.warehouse_id,
        warehouse_name: candidate.warehouse_name,
        current_stock: candidate.quantity,
        threshold: candidate.reorder_threshold,
        days_until_stockout,
        supplier: candidate.supplier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SupplierSummary;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use stockalert_core::{ContactEmail, ProductId, Sku, SupplierId, WarehouseId};

    /// Gateway + recency + velocity driven by fixed tables.
    #[derive(Default)]
    struct Scripted {
        candidates: Vec<InventoryCandidate>,
        stale: HashSet<ProductId>,
        velocities: HashMap<(ProductId, WarehouseId), f64>,
        fail_gateway: bool,
        fail_velocity_for: Option<ProductId>,
        seen_windows: Mutex<Vec<(&'static str, u32)>>,
    }

    #[async_trait]
    impl AlertQueryGateway for Scripted {
        async fn find_low_stock_candidates(
            &self,
            _company_id: CompanyId,
        ) -> Result<Vec<InventoryCandidate>, UpstreamDataError> {
            if self.fail_gateway {
                return Err(UpstreamDataError::query("connection refused"));
            }
            Ok(self.candidates.clone())
        }
    }

    #[async_trait]
    impl RecentSalesCheck for Scripted {
        async fn has_recent_sales(
            &self,
            product_id: ProductId,
            window_days: u32,
        ) -> Result<bool, UpstreamDataError> {
            self.seen_windows.lock().unwrap().push(("recent", window_days));
            Ok(!self.stale.contains(&product_id))
        }
    }

    #[async_trait]
    impl SalesVelocity for Scripted {
        async fn average_daily_sales(
            &self,
            product_id: ProductId,
            warehouse_id: WarehouseId,
            window_days: u32,
        ) -> Result<f64, UpstreamDataError> {
            self.seen_windows.lock().unwrap().push(("velocity", window_days));
            if self.fail_velocity_for == Some(product_id) {
                return Err(UpstreamDataError::query("history table unavailable"));
            }
            Ok(self
                .velocities
                .get(&(product_id, warehouse_id))
                .copied()
                .unwrap_or(0.0))
        }
    }

    fn candidate(product: i64, warehouse: i64, quantity: i32, threshold: i32) -> InventoryCandidate {
        InventoryCandidate {
            product_id: ProductId::from_raw(product),
            product_name: format!("Product {product}"),
            sku: Sku::from_raw(format!("SKU-{product}")),
            warehouse_id: WarehouseId::from_raw(warehouse),
            warehouse_name: format!("Warehouse {warehouse}"),
            quantity,
            reorder_threshold: threshold,
            supplier: SupplierSummary {
                id: SupplierId::from_raw(100 + product),
                name: "Acme Supply".to_string(),
                contact_email: ContactEmail::from_raw("orders@acme.test"),
            },
        }
    }

    fn computer(scripted: Scripted, windows: AlertWindows) -> (LowStockAlertComputer, Arc<Scripted>) {
        let s = Arc::new(scripted);
        let c = LowStockAlertComputer::new(s.clone(), s.clone(), s.clone(), windows);
        (c, s)
    }

    fn company() -> CompanyId {
        CompanyId::from_raw(1)
    }

    #[tokio::test]
    async fn placeholder_collaborators_alert_on_every_candidate() {
        let gateway = Arc::new(Scripted {
            candidates: vec![candidate(1, 1, 12, 20), candidate(2, 1, 3, 20)],
            ..Default::default()
        });
        let c = LowStockAlertComputer::new(
            gateway,
            Arc::new(crate::ports::AlwaysRecentSales),
            Arc::new(crate::ports::FixedVelocity(5.0)),
            AlertWindows::default(),
        );

        let alerts = c.compute_low_stock_alerts(company()).await.unwrap();
        let days: Vec<i32> = alerts.iter().map(|a| a.days_until_stockout).collect();
        assert_eq!(days, vec![2, 0]);
    }

    #[test]
    fn projection_truncates() {
        assert_eq!(project_days_until_stockout(10, 5.0), 2);
        assert_eq!(project_days_until_stockout(11, 5.0), 2);
        assert_eq!(project_days_until_stockout(4, 5.0), 0);
        assert_eq!(project_days_until_stockout(7, 0.5), 14);
    }

    #[test]
    fn projection_without_velocity_is_sentinel() {
        assert_eq!(project_days_until_stockout(10, 0.0), NO_VELOCITY_DAYS);
        assert_eq!(project_days_until_stockout(10, -1.0), NO_VELOCITY_DAYS);
        assert_eq!(project_days_until_stockout(10, f64::NAN), NO_VELOCITY_DAYS);
        assert_eq!(project_days_until_stockout(10, f64::INFINITY), NO_VELOCITY_DAYS);
    }

    #[test]
    fn projection_saturates_for_tiny_velocity() {
        assert_eq!(project_days_until_stockout(i32::MAX, 1e-300), i32::MAX);
    }

    #[test]
    fn zero_windows_are_rejected() {
        assert!(AlertWindows::new(0, 30).is_err());
        assert!(AlertWindows::new(30, 0).is_err());
        assert_eq!(AlertWindows::new(30, 30).unwrap(), AlertWindows::default());
    }

    #[tokio::test]
    async fn velocity_five_with_ten_units_gives_two_days() {
        let mut s = Scripted { candidates: vec![candidate(1, 1, 10, 15)], ..Default::default() };
        s.velocities.insert((ProductId::from_raw(1), WarehouseId::from_raw(1)), 5.0);
        let (c, _) = computer(s, AlertWindows::default());

        let alerts = c.compute_low_stock_alerts(company()).await.unwrap();
        assert_eq!(alerts.len(), 1);
        let a = &alerts[0];
        assert_eq!(a.days_until_stockout, 2);
        assert_eq!(a.current_stock, 10);
        assert_eq!(a.threshold, 15);
        assert_eq!(a.product_name, "Product 1");
        assert_eq!(a.warehouse_name, "Warehouse 1");
        assert_eq!(a.supplier.id, SupplierId::from_raw(101));
        assert_eq!(a.supplier.contact_email.as_str(), "orders@acme.test");
    }

    #[tokio::test]
    async fn zero_velocity_gives_sentinel() {
        let s = Scripted { candidates: vec![candidate(2, 1, 3, 5)], ..Default::default() };
        let (c, _) = computer(s, AlertWindows::default());

        let alerts = c.compute_low_stock_alerts(company()).await.unwrap();
        assert_eq!(alerts[0].days_until_stockout, NO_VELOCITY_DAYS);
    }

    #[tokio::test]
    async fn product_without_recent_sales_is_skipped() {
        let mut s = Scripted { candidates: vec![candidate(3, 1, 1, 5)], ..Default::default() };
        s.stale.insert(ProductId::from_raw(3));
        let (c, _) = computer(s, AlertWindows::default());

        let alerts = c.compute_low_stock_alerts(company()).await.unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn kept_candidates_keep_gateway_order() {
        let mut s = Scripted {
            candidates: vec![candidate(9, 1, 1, 5), candidate(4, 1, 2, 5), candidate(6, 2, 3, 5)],
            ..Default::default()
        };
        s.stale.insert(ProductId::from_raw(4));
        let (c, _) = computer(s, AlertWindows::default());

        let alerts = c.compute_low_stock_alerts(company()).await.unwrap();
        let ids: Vec<i64> = alerts.iter().map(|a| a.product_id.get()).collect();
        assert_eq!(ids, vec![9, 6]);
    }

    #[tokio::test]
    async fn no_candidates_no_alerts() {
        let (c, s) = computer(Scripted::default(), AlertWindows::default());
        let alerts = c.compute_low_stock_alerts(company()).await.unwrap();
        assert!(alerts.is_empty());
        assert!(s.seen_windows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_propagates_unchanged() {
        let s = Scripted { fail_gateway: true, ..Default::default() };
        let (c, _) = computer(s, AlertWindows::default());

        let err = c.compute_low_stock_alerts(company()).await.unwrap_err();
        assert_eq!(err, UpstreamDataError::query("connection refused"));
    }

    #[tokio::test]
    async fn velocity_failure_aborts_without_partial_result() {
        let s = Scripted {
            candidates: vec![candidate(1, 1, 1, 5), candidate(2, 1, 1, 5)],
            fail_velocity_for: Some(ProductId::from_raw(2)),
            ..Default::default()
        };
        let (c, _) = computer(s, AlertWindows::default());

        let err = c.compute_low_stock_alerts(company()).await.unwrap_err();
        assert!(matches!(err, UpstreamDataError::Query(_)));
    }

    #[tokio::test]
    async fn configured_windows_reach_collaborators() {
        let s = Scripted { candidates: vec![candidate(1, 1, 1, 5)], ..Default::default() };
        let (c, s) = computer(s, AlertWindows::new(7, 14).unwrap());

        c.compute_low_stock_alerts(company()).await.unwrap();
        assert_eq!(
            *s.seen_windows.lock().unwrap(),
            vec![("recent", 7), ("velocity", 14)]
        );
    }

    #[tokio::test]
    async fn velocity_is_not_queried_for_skipped_candidates() {
        let mut s = Scripted { candidates: vec![candidate(5, 1, 1, 5)], ..Default::default() };
        s.stale.insert(ProductId::from_raw(5));
        let (c, s) = computer(s, AlertWindows::default());

        c.compute_low_stock_alerts(company()).await.unwrap();
        assert_eq!(*s.seen_windows.lock().unwrap(), vec![("recent", 30)]);
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: output = gateway order restricted to recent candidates,
        /// with the projection applied per record.
        #[test]
        fn filter_and_projection_hold_for_any_candidates(
            rows in prop::collection::vec(
                (0i32..10_000, any::<bool>(), prop_oneof![Just(0.0f64), 0.01f64..500.0]),
                0..25,
            )
        ) {
            let mut s = Scripted::default();
            for (i, (quantity, recent, velocity)) in rows.iter().enumerate() {
                let product = i as i64 + 1;
                s.candidates.push(candidate(product, 1, *quantity, quantity.saturating_add(1)));
                if !*recent {
                    s.stale.insert(ProductId::from_raw(product));
                }
                s.velocities.insert((ProductId::from_raw(product), WarehouseId::from_raw(1)), *velocity);
            }
            let (c, _) = computer(s, AlertWindows::default());

            let alerts = block_on(c.compute_low_stock_alerts(company())).unwrap();

            let expected: Vec<(i64, i32)> = rows
                .iter()
                .enumerate()
                .filter(|(_, (_, recent, _))| *recent)
                .map(|(i, (quantity, _, velocity))| {
                    let days = if *velocity > 0.0 {
                        (f64::from(*quantity) / velocity).floor() as i32
                    } else {
                        NO_VELOCITY_DAYS
                    };
                    (i as i64 + 1, days)
                })
                .collect();
            let actual: Vec<(i64, i32)> = alerts
                .iter()
                .map(|a| (a.product_id.get(), a.days_until_stockout))
                .collect();

            prop_assert_eq!(actual, expected);
            for a in &alerts {
                prop_assert!(a.days_until_stockout >= 0);
            }
        }
    }
}
