//! Read-only sales analytics.
//!
//! Everything here is recomputed from order and catalog records on demand.
//! Cancelled orders never count toward revenue.

mod error;
pub mod pipeline;
mod service;
mod window;

pub use error::{AnalyticsError, Result};
pub use pipeline::{CategorySales, MonthlySales, ProductSales, RevenueSummary, TopProduct};
pub use service::{AnalyticsReport, AnalyticsService, DashboardConfig, DashboardStats};
pub use window::AnalyticsWindow;
