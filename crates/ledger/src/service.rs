//! Order ledger: placement, cancellation, status transitions and queries.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use domain::{LineItem, Order, OrderNumber, OrderStatus, PlaceOrder, UpdateOrderStatus};
use store::{CatalogStore, OrderQuery, OrderStore, StoreError};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::reservation::ReservationLog;

/// Filter for [`OrderLedger::list_orders`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    /// Only orders owned by this user.
    pub owner: Option<UserId>,
}

/// Coordinates stock reservations with order records.
///
/// Placement reserves every line item in order and releases exactly the
/// reserved ones, newest first, if any later step fails. Cancellation claims
/// the status change with a version check before releasing stock, so stock is
/// restored at most once per order.
pub struct OrderLedger<C, O>
where
    C: CatalogStore,
    O: OrderStore,
{
    catalog: Arc<C>,
    orders: Arc<O>,
    config: LedgerConfig,
}

impl<C, O> Clone for OrderLedger<C, O>
where
    C: CatalogStore,
    O: OrderStore,
{
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            orders: Arc::clone(&self.orders),
            config: self.config,
        }
    }
}

impl<C, O> OrderLedger<C, O>
where
    C: CatalogStore,
    O: OrderStore,
{
    /// Creates a new ledger over the given stores.
    pub fn new(catalog: Arc<C>, orders: Arc<O>, config: LedgerConfig) -> Self {
        Self {
            catalog,
            orders,
            config,
        }
    }

    pub fn config(&self) -> LedgerConfig {
        self.config
    }

    /// Places an order.
    ///
    /// All-or-nothing: on any failure no stock stays reserved and no order is
    /// recorded.
    #[tracing::instrument(skip(self, command), fields(items = command.items.len()))]
    pub async fn place_order(&self, command: PlaceOrder) -> Result<Order> {
        let start = Instant::now();
        let result = self.try_place_order(command).await;

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    order_number = %order.order_number(),
                    total = %order.total_amount(),
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("order_placement_failures_total", "kind" => e.kind().as_str())
                    .increment(1);
                tracing::warn!(error = %e, kind = %e.kind(), "order placement failed");
            }
        }
        metrics::histogram!("order_placement_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn try_place_order(&self, command: PlaceOrder) -> Result<Order> {
        // Validation happens here, before any stock is touched.
        let order = Order::place(command, self.config.verify_totals, Utc::now())?;
        let mut log = ReservationLog::new(order.id());

        for item in order.items() {
            match self.catalog.reserve(item.product_id, item.quantity).await {
                Ok(remaining) => {
                    metrics::counter!("stock_reservations_total").increment(1);
                    tracing::debug!(
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        remaining,
                        "stock reserved"
                    );
                    log.record(item.product_id, item.quantity);
                }
                Err(e) => {
                    metrics::counter!("stock_reservation_failures_total").increment(1);
                    self.compensate(&mut log).await;
                    return Err(reservation_error(e, item));
                }
            }
        }

        match self.orders.insert_order(order).await {
            Ok(stored) => {
                log.commit();
                Ok(stored)
            }
            Err(e) => {
                tracing::warn!(order_id = %log.order_id(), error = %e, "failed to persist order");
                self.compensate(&mut log).await;
                Err(e.into())
            }
        }
    }

    /// Releases everything recorded in `log`, most recent first.
    ///
    /// A release that fails is logged and skipped; the remaining releases
    /// still run.
    async fn compensate(&self, log: &mut ReservationLog) {
        let undo = log.begin_compensation();
        if !undo.is_empty() {
            tracing::info!(
                order_id = %log.order_id(),
                reservations = undo.len(),
                "releasing reserved stock"
            );
        }

        for reserved in undo {
            match self
                .catalog
                .release(reserved.product_id, reserved.quantity)
                .await
            {
                Ok(_) => {
                    metrics::counter!("stock_compensations_total").increment(1);
                }
                Err(e) => {
                    tracing::error!(
                        order_id = %log.order_id(),
                        product_id = %reserved.product_id,
                        quantity = reserved.quantity,
                        error = %e,
                        "compensating release failed"
                    );
                }
            }
        }
        log.rolled_back();
    }

    /// Cancels an order and restores its stock.
    ///
    /// Cancelling an order that is already cancelled returns it unchanged and
    /// releases nothing.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let order = self.load(order_id).await?;
        self.cancel_loaded(order).await
    }

    async fn cancel_loaded(&self, mut order: Order) -> Result<Order> {
        let order_id = order.id();
        let expected_version = order.version();

        if !order.cancel(Utc::now()) {
            return Ok(order);
        }

        let cancelled = match self.orders.update_order(order, expected_version).await {
            Ok(cancelled) => cancelled,
            Err(StoreError::ConcurrencyConflict { .. }) => {
                // Someone else wrote first. If they cancelled, the stock is
                // theirs to release.
                let current = self.load(order_id).await?;
                if current.is_cancelled() {
                    return Ok(current);
                }
                return Err(LedgerError::ConcurrentModification(order_id));
            }
            Err(e) => return Err(e.into()),
        };

        self.release_items(&cancelled).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(
            order_id = %order_id,
            order_number = %cancelled.order_number(),
            "order cancelled"
        );
        Ok(cancelled)
    }

    /// Restocks every line item of a cancelled order.
    ///
    /// Products that no longer exist are skipped.
    async fn release_items(&self, order: &Order) -> Result<()> {
        let mut failed: Vec<ProductId> = Vec::new();

        for item in order.items() {
            match self.catalog.release(item.product_id, item.quantity).await {
                Ok(_) => {}
                Err(StoreError::ProductNotFound(product_id)) => {
                    tracing::warn!(
                        order_id = %order.id(),
                        %product_id,
                        "product gone, skipping stock release"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        order_id = %order.id(),
                        product_id = %item.product_id,
                        error = %e,
                        "stock release failed"
                    );
                    failed.push(item.product_id);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::ReleaseIncomplete {
                order_id: order.id(),
                failed,
            })
        }
    }

    /// Moves an order to a new status, optionally attaching a tracking number.
    ///
    /// Moving to Cancelled takes the cancellation path, stock release
    /// included. Cancelled orders cannot move anywhere else.
    #[tracing::instrument(skip(self), fields(order_id = %command.order_id, status = %command.status))]
    pub async fn update_status(&self, command: UpdateOrderStatus) -> Result<Order> {
        let mut order = self.load(command.order_id).await?;
        let now = Utc::now();

        let updated = if command.status == OrderStatus::Cancelled {
            let mut cancelled = self.cancel_loaded(order).await?;
            if let Some(tracking_number) = command.tracking_number {
                let expected_version = cancelled.version();
                cancelled.attach_tracking(tracking_number, now)?;
                cancelled = self.orders.update_order(cancelled, expected_version).await?;
            }
            cancelled
        } else {
            let expected_version = order.version();
            let changed = order.transition_to(command.status, now)?;
            let tracked = match command.tracking_number {
                Some(tracking_number) => {
                    order.attach_tracking(tracking_number, now)?;
                    true
                }
                None => false,
            };
            if !changed && !tracked {
                return Ok(order);
            }
            self.orders.update_order(order, expected_version).await?
        };

        metrics::counter!("order_status_updates_total", "status" => command.status.as_str())
            .increment(1);
        tracing::info!(status = %updated.status(), "order status updated");
        Ok(updated)
    }

    /// Attaches or replaces the tracking number without touching status.
    #[tracing::instrument(skip(self))]
    pub async fn attach_tracking(
        &self,
        order_id: OrderId,
        tracking_number: String,
    ) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        let expected_version = order.version();
        order.attach_tracking(tracking_number, Utc::now())?;
        Ok(self.orders.update_order(order, expected_version).await?)
    }

    /// Loads an order by storage id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.load(order_id).await
    }

    /// Loads an order by its public order number.
    pub async fn get_order_by_number(&self, order_number: &str) -> Result<Order> {
        self.orders
            .get_order_by_number(&OrderNumber::new(order_number))
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(order_number.to_string()))
    }

    /// Lists orders, newest first.
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let query = match filter.owner {
            Some(owner) => OrderQuery::for_user(owner),
            None => OrderQuery::new(),
        };
        Ok(self.orders.query_orders(query).await?)
    }

    /// Lists one user's orders, newest first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        self.list_orders(OrderFilter {
            owner: Some(user_id),
        })
        .await
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(order_id.to_string()))
    }
}

/// Names the offending line item in a reservation failure.
fn reservation_error(e: StoreError, item: &LineItem) -> LedgerError {
    match e {
        StoreError::InsufficientStock {
            product_id,
            requested,
            available,
        } => LedgerError::InsufficientStock {
            product_id,
            product_name: item.name.clone(),
            requested,
            available,
        },
        other => other.into(),
    }
}
