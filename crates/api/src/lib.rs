//! HTTP API server for the storefront order core.
//!
//! Provides REST endpoints for order placement and lifecycle, catalog
//! administration and sales analytics, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use analytics::AnalyticsService;
use axum::Router;
use axum::routing::{get, post, put};
use ledger::OrderLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Storage;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Storage> {
    pub ledger: OrderLedger<S, S>,
    pub analytics: AnalyticsService<S>,
    pub storage: Arc<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Storage>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/orders",
            post(routes::orders::place::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/orders/number/{order_number}",
            get(routes::orders::get_by_number::<S>),
        )
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/users/{id}/orders", get(routes::orders::for_user::<S>))
        .route(
            "/products",
            post(routes::products::create::<S>).get(routes::products::list::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .patch(routes::products::update::<S>)
                .delete(routes::products::deactivate::<S>),
        )
        .route("/products/{id}/stock", put(routes::products::set_stock::<S>))
        .route(
            "/products/{id}/reviews",
            post(routes::products::add_review::<S>),
        )
        .route("/admin/dashboard", get(routes::admin::dashboard::<S>))
        .route("/admin/analytics", get(routes::admin::analytics::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the ledger and analytics service over one storage backend.
pub fn create_state<S: Storage>(storage: S, config: &Config) -> Arc<AppState<S>> {
    let storage = Arc::new(storage);
    let ledger = OrderLedger::new(storage.clone(), storage.clone(), config.ledger());
    let analytics = AnalyticsService::new(storage.clone(), config.dashboard());

    Arc::new(AppState {
        ledger,
        analytics,
        storage,
    })
}
