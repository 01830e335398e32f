//! Configuration loading from the process environment.

use std::net::SocketAddr;

use anyhow::{Context, bail};

use stockalert_inventory::AlertWindows;
use stockalert_inventory::alerts::DEFAULT_WINDOW_DAYS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime configuration for the API process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Wire the Postgres adapters instead of the in-memory store.
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub windows: AlertWindows,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (tests pass a map).
    ///
    /// Unset keys fall back to defaults; set but unparsable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:8080")?;

        let use_persistent_stores = match lookup("USE_PERSISTENT_STORES") {
            Some(v) => v
                .trim()
                .parse::<bool>()
                .context("USE_PERSISTENT_STORES must be true or false")?,
            None => false,
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if use_persistent_stores && database_url.is_none() {
            bail!("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        }

        let recent_sales_days = window_days(&lookup, "ALERT_RECENT_SALES_WINDOW_DAYS")?;
        let velocity_days = window_days(&lookup, "ALERT_VELOCITY_WINDOW_DAYS")?;
        let windows = AlertWindows::new(recent_sales_days, velocity_days)?;

        Ok(Self {
            bind_addr,
            use_persistent_stores,
            database_url,
            windows,
        })
    }
}

fn window_days(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<u32> {
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<u32>()
            .with_context(|| format!("{key} must be a whole number of days")),
        None => Ok(DEFAULT_WINDOW_DAYS),
    }
}
