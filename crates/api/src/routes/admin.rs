//! Admin dashboard and analytics endpoints.

use std::sync::Arc;

use analytics::{
    AnalyticsError, AnalyticsReport, AnalyticsWindow, CategorySales, DashboardStats, MonthlySales,
    TopProduct,
};
use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use domain::{Category, Product};
use serde::{Deserialize, Serialize};
use store::Storage;

use super::orders::OrderResponse;
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    /// `week`, `month` or `year`. Defaults to `month`.
    pub period: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct DashboardResponse {
    pub total_revenue_cents: i64,
    pub total_orders: u64,
    pub total_products: u64,
    pub total_customers: u64,
    pub recent_orders: Vec<OrderResponse>,
    pub low_stock_products: Vec<LowStockResponse>,
    pub sales_by_category: Vec<CategorySalesResponse>,
    pub monthly_sales: Vec<MonthlySalesResponse>,
}

#[derive(Serialize)]
pub struct LowStockResponse {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub stock: u32,
}

#[derive(Serialize)]
pub struct CategorySalesResponse {
    pub category: Category,
    pub quantity: u64,
    pub revenue_cents: i64,
}

#[derive(Serialize)]
pub struct MonthlySalesResponse {
    pub month: u32,
    pub orders: u64,
    pub revenue_cents: i64,
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub period: String,
    pub from: DateTime<Utc>,
    pub total_sales_cents: i64,
    pub total_orders: u64,
    pub avg_order_value_cents: i64,
    pub top_products: Vec<TopProductResponse>,
}

#[derive(Serialize)]
pub struct TopProductResponse {
    pub product_id: String,
    pub name: String,
    pub quantity: u64,
    pub revenue_cents: i64,
}

impl From<&Product> for LowStockResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category,
            stock: product.stock(),
        }
    }
}

impl From<&CategorySales> for CategorySalesResponse {
    fn from(sales: &CategorySales) -> Self {
        Self {
            category: sales.category,
            quantity: sales.quantity,
            revenue_cents: sales.revenue.cents(),
        }
    }
}

impl From<&MonthlySales> for MonthlySalesResponse {
    fn from(sales: &MonthlySales) -> Self {
        Self {
            month: sales.month,
            orders: sales.orders,
            revenue_cents: sales.revenue.cents(),
        }
    }
}

impl From<TopProduct> for TopProductResponse {
    fn from(top: TopProduct) -> Self {
        Self {
            product_id: top.product_id.to_string(),
            name: top.name,
            quantity: top.quantity,
            revenue_cents: top.revenue.cents(),
        }
    }
}

impl From<DashboardStats> for DashboardResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_revenue_cents: stats.total_revenue.cents(),
            total_orders: stats.total_orders,
            total_products: stats.total_products,
            total_customers: stats.total_customers,
            recent_orders: stats.recent_orders.iter().map(OrderResponse::from).collect(),
            low_stock_products: stats
                .low_stock_products
                .iter()
                .map(LowStockResponse::from)
                .collect(),
            sales_by_category: stats
                .sales_by_category
                .iter()
                .map(CategorySalesResponse::from)
                .collect(),
            monthly_sales: stats
                .monthly_sales
                .iter()
                .map(MonthlySalesResponse::from)
                .collect(),
        }
    }
}

impl From<AnalyticsReport> for AnalyticsResponse {
    fn from(report: AnalyticsReport) -> Self {
        Self {
            period: report.period,
            from: report.from,
            total_sales_cents: report.total_sales.cents(),
            total_orders: report.total_orders,
            avg_order_value_cents: report.avg_order_value.cents(),
            top_products: report
                .top_products
                .into_iter()
                .map(TopProductResponse::from)
                .collect(),
        }
    }
}

// -- Handlers --

/// GET /admin/dashboard
#[tracing::instrument(skip(state))]
pub async fn dashboard<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let stats = state.analytics.dashboard_stats().await?;
    Ok(Json(DashboardResponse::from(stats)))
}

/// GET /admin/analytics?period=week|month|year
#[tracing::instrument(skip(state, query))]
pub async fn analytics<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let window = match query.period.as_deref() {
        Some(period) => period
            .parse::<AnalyticsWindow>()
            .map_err(AnalyticsError::from)?,
        None => AnalyticsWindow::default(),
    };

    let report = state.analytics.analytics(window).await?;
    Ok(Json(AnalyticsResponse::from(report)))
}
