//! Application configuration loaded from environment variables.

use analytics::DashboardConfig;
use ledger::LedgerConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory storage when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default `10`)
/// - `LOW_STOCK_THRESHOLD`: dashboard low-stock cutoff (default `10`)
/// - `RECENT_ORDERS_LIMIT`: dashboard recent orders (default `10`)
/// - `TOP_PRODUCTS_LIMIT`: analytics top products (default `5`)
/// - `VERIFY_ORDER_TOTALS`: check submitted subtotal and total (default `true`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub low_stock_threshold: u32,
    pub recent_orders_limit: usize,
    pub top_products_limit: usize,
    pub verify_order_totals: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        fn parse_key<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse().ok())
        }

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_key(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_key(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            low_stock_threshold: parse_key(&lookup, "LOW_STOCK_THRESHOLD")
                .unwrap_or(defaults.low_stock_threshold),
            recent_orders_limit: parse_key(&lookup, "RECENT_ORDERS_LIMIT")
                .unwrap_or(defaults.recent_orders_limit),
            top_products_limit: parse_key(&lookup, "TOP_PRODUCTS_LIMIT")
                .unwrap_or(defaults.top_products_limit),
            verify_order_totals: parse_key(&lookup, "VERIFY_ORDER_TOTALS")
                .unwrap_or(defaults.verify_order_totals),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ledger(&self) -> LedgerConfig {
        LedgerConfig::new(self.verify_order_totals)
    }

    pub fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            low_stock_threshold: self.low_stock_threshold,
            recent_orders_limit: self.recent_orders_limit,
            top_products_limit: self.top_products_limit,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let dashboard = DashboardConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 10,
            low_stock_threshold: dashboard.low_stock_threshold,
            recent_orders_limit: dashboard.recent_orders_limit,
            top_products_limit: dashboard.top_products_limit,
            verify_order_totals: true,
        }
    }
}
