//! Dashboard and windowed analytics over the order ledger.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Datelike, Utc};
use common::ProductId;
use domain::{Category, Money, Order, Product};
use serde::Serialize;
use store::{CatalogStore, OrderQuery, OrderStore, UserDirectory};

use crate::error::Result;
use crate::pipeline::{self, CategorySales, MonthlySales, TopProduct};
use crate::window::AnalyticsWindow;

/// Limits and thresholds for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Products with stock strictly below this are reported.
    pub low_stock_threshold: u32,
    pub recent_orders_limit: usize,
    pub top_products_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            recent_orders_limit: 10,
            top_products_limit: 5,
        }
    }
}

/// Store-wide figures for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_revenue: Money,
    pub total_orders: u64,
    pub total_products: u64,
    pub total_customers: u64,
    /// Newest first, cancelled orders included.
    pub recent_orders: Vec<Order>,
    /// Lowest stock first.
    pub low_stock_products: Vec<Product>,
    pub sales_by_category: Vec<CategorySales>,
    /// Current calendar year only.
    pub monthly_sales: Vec<MonthlySales>,
}

/// Sales figures for one aggregation window.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub period: String,
    pub from: DateTime<Utc>,
    pub total_sales: Money,
    pub total_orders: u64,
    pub avg_order_value: Money,
    pub top_products: Vec<TopProduct>,
}

/// Computes aggregates from order and catalog records.
///
/// Holds no state of its own. Every call reads the stores afresh.
pub struct AnalyticsService<S> {
    storage: Arc<S>,
    config: DashboardConfig,
}

impl<S> Clone for AnalyticsService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: self.config,
        }
    }
}

impl<S> AnalyticsService<S>
where
    S: CatalogStore + OrderStore + UserDirectory,
{
    pub fn new(storage: Arc<S>, config: DashboardConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> DashboardConfig {
        self.config
    }

    /// Dashboard figures as of now.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.dashboard_stats_at(Utc::now()).await
    }

    /// Dashboard figures with monthly sales taken from the calendar year of
    /// `now`.
    #[tracing::instrument(skip(self))]
    pub async fn dashboard_stats_at(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let start = Instant::now();

        let billable = self
            .storage
            .query_orders(OrderQuery::new().exclude_cancelled())
            .await?;
        let revenue = pipeline::revenue_summary(&billable);

        let categories = self.categories_for(&billable).await?;
        let sales_by_category = pipeline::sales_by_category(&billable, &categories);
        let monthly_sales = pipeline::monthly_sales(&billable, now.year());

        let recent_orders = self
            .storage
            .query_orders(OrderQuery::new().limit(self.config.recent_orders_limit))
            .await?;
        let low_stock_products = self
            .storage
            .low_stock_products(self.config.low_stock_threshold)
            .await?;
        let total_products = self.storage.count_products().await?;
        let total_customers = self.storage.count_customers().await?;

        metrics::histogram!("analytics_compute_duration_seconds", "report" => "dashboard")
            .record(start.elapsed().as_secs_f64());
        tracing::debug!(
            orders = revenue.total_orders,
            revenue = %revenue.total_revenue,
            "dashboard computed"
        );

        Ok(DashboardStats {
            total_revenue: revenue.total_revenue,
            total_orders: revenue.total_orders,
            total_products,
            total_customers,
            recent_orders,
            low_stock_products,
            sales_by_category,
            monthly_sales,
        })
    }

    /// Sales figures for a window ending now.
    pub async fn analytics(&self, window: AnalyticsWindow) -> Result<AnalyticsReport> {
        self.analytics_at(window, Utc::now()).await
    }

    /// Sales figures for a window ending at `now`.
    #[tracing::instrument(skip(self), fields(period = %window))]
    pub async fn analytics_at(
        &self,
        window: AnalyticsWindow,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport> {
        let start = Instant::now();
        let from = window.lower_bound(now);

        let orders = self
            .storage
            .query_orders(
                OrderQuery::new()
                    .created_from(from)
                    .created_to(now)
                    .exclude_cancelled(),
            )
            .await?;
        let revenue = pipeline::revenue_summary(pipeline::billable(&orders));

        let ranked: Vec<_> = pipeline::rank_products(pipeline::billable(&orders))
            .into_iter()
            .take(self.config.top_products_limit)
            .collect();
        let ids: Vec<ProductId> = ranked.iter().map(|r| r.product_id).collect();
        let names: HashMap<ProductId, String> = self
            .storage
            .get_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let top_products = pipeline::enrich_top_products(ranked, &names);

        metrics::histogram!("analytics_compute_duration_seconds", "report" => "analytics")
            .record(start.elapsed().as_secs_f64());

        Ok(AnalyticsReport {
            period: window.to_string(),
            from,
            total_sales: revenue.total_revenue,
            total_orders: revenue.total_orders,
            avg_order_value: revenue.average_order_value,
            top_products,
        })
    }

    async fn categories_for(&self, orders: &[Order]) -> Result<HashMap<ProductId, Category>> {
        let ids = pipeline::referenced_products(orders);
        Ok(self
            .storage
            .get_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.category))
            .collect())
    }
}
