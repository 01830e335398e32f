use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use stockalert_infra::{AppConfig, InMemoryInventoryStore, PostgresInventoryStore};
use stockalert_inventory::{AlertWindows, LowStockAlertComputer, ProductCatalog};

const MAX_DB_CONNECTIONS: u32 = 10;

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub alerts: LowStockAlertComputer,
    pub catalog: Arc<dyn ProductCatalog>,
}

impl AppServices {
    /// Wire every collaborator to one in-memory store.
    pub fn in_memory(store: Arc<InMemoryInventoryStore>, windows: AlertWindows) -> Self {
        Self {
            alerts: LowStockAlertComputer::new(store.clone(), store.clone(), store.clone(), windows),
            catalog: store,
        }
    }

    pub fn postgres(store: PostgresInventoryStore, windows: AlertWindows) -> Self {
        let store = Arc::new(store);
        Self {
            alerts: LowStockAlertComputer::new(store.clone(), store.clone(), store.clone(), windows),
            catalog: store,
        }
    }
}

/// Select adapters from config: Postgres when `USE_PERSISTENT_STORES=true`,
/// otherwise an empty in-memory store.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    if !config.use_persistent_stores {
        tracing::warn!("USE_PERSISTENT_STORES not enabled; using an empty in-memory inventory store");
        return Ok(AppServices::in_memory(
            Arc::new(InMemoryInventoryStore::new()),
            config.windows,
        ));
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;

    let pool = PgPoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    let store = PostgresInventoryStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("failed to apply inventory schema")?;

    tracing::info!(
        recent_sales_days = config.windows.recent_sales_days,
        velocity_days = config.windows.velocity_days,
        "using Postgres inventory store"
    );
    Ok(AppServices::postgres(store, config.windows))
}
