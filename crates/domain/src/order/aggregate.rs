//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{
    LineItem, OrderError, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus, PlaceOrder,
    PriceBreakdown, ShippingAddress,
};
use crate::money::Money;

/// Order aggregate root.
///
/// Created once at placement; afterwards only status changes, cancellation
/// and tracking updates mutate it. Line items and pricing never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Storage identity.
    id: OrderId,

    /// Public order number.
    order_number: OrderNumber,

    /// Owning user; `None` for guest checkout.
    user_id: Option<UserId>,

    items: Vec<LineItem>,
    shipping_address: ShippingAddress,
    payment_method: PaymentMethod,
    pricing: PriceBreakdown,
    coupon_code: Option<String>,
    order_notes: Option<String>,

    status: OrderStatus,
    payment_status: PaymentStatus,
    tracking_number: Option<String>,

    /// Set on the transition into Delivered.
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: u64,
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn payment_method(&self) -> &PaymentMethod {
        &self.payment_method
    }

    pub fn pricing(&self) -> &PriceBreakdown {
        &self.pricing
    }

    /// Returns the total amount charged.
    pub fn total_amount(&self) -> Money {
        self.pricing.total_amount
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    pub fn order_notes(&self) -> Option<&str> {
        self.order_notes.as_deref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the version after a successful store write.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

// Command methods
impl Order {
    /// Builds a placed order from a validated command.
    ///
    /// Payment is pending for cash on delivery and completed otherwise.
    pub fn place(
        command: PlaceOrder,
        verify_totals: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        command.validate(verify_totals)?;

        let payment_status = if command.payment_method.is_cash_on_delivery() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Completed
        };

        Ok(Self {
            id: OrderId::new(),
            order_number: OrderNumber::generate(now),
            user_id: command.user_id,
            items: command.items,
            shipping_address: command.shipping_address,
            payment_method: command.payment_method,
            pricing: command.pricing,
            coupon_code: command.coupon_code,
            order_notes: command.order_notes,
            status: OrderStatus::Placed,
            payment_status,
            tracking_number: None,
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Moves the order to `next`.
    ///
    /// Entering Delivered stamps `delivered_at` and completes payment.
    /// Entering Cancelled behaves like [`Order::cancel`]. Leaving Cancelled is
    /// rejected. Returns false when the order was already in `next`.
    pub fn transition_to(
        &mut self,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }
        if self.status == next {
            return Ok(false);
        }

        match next {
            OrderStatus::Cancelled => return Ok(self.cancel(now)),
            OrderStatus::Delivered => {
                self.delivered_at = Some(now);
                self.payment_status = PaymentStatus::Completed;
            }
            _ => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(true)
    }

    /// Marks the order cancelled. Returns false if it already was.
    ///
    /// Stock release is the caller's job and must only happen when this
    /// returns true.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.can_cancel() {
            return false;
        }
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Attaches or replaces the carrier tracking number.
    pub fn attach_tracking(
        &mut self,
        tracking_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        let tracking_number = tracking_number.into();
        if tracking_number.trim().is_empty() {
            return Err(OrderError::EmptyTrackingNumber);
        }
        self.tracking_number = Some(tracking_number);
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use common::ProductId;

    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: Some("Priya Sharma".to_string()),
            phone: None,
            street: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            country: "India".to_string(),
        }
    }

    fn command(payment: &str) -> PlaceOrder {
        PlaceOrder::new(
            Some(UserId::new()),
            vec![LineItem::new(
                ProductId::new(),
                "Canvas Tote",
                Money::from_major(100),
                2,
            )],
            address(),
            PaymentMethod::new(payment),
        )
    }

    #[test]
    fn test_place_sets_initial_state() {
        let now = Utc::now();
        let order = Order::place(command("card"), true, now).unwrap();

        assert_eq!(order.status(), OrderStatus::Placed);
        assert_eq!(order.payment_status(), PaymentStatus::Completed);
        assert_eq!(order.total_amount(), Money::from_major(200));
        assert_eq!(order.total_quantity(), 2);
        assert_eq!(order.created_at(), now);
        assert_eq!(order.version(), 0);
        assert!(order.delivered_at().is_none());
    }

    #[test]
    fn test_cash_on_delivery_payment_is_pending() {
        let order = Order::place(command("cash-on-delivery"), true, Utc::now()).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Pending);

        let order = Order::place(command("cod"), true, Utc::now()).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_place_rejects_empty_order() {
        let mut cmd = command("card");
        cmd.items.clear();
        assert_eq!(
            Order::place(cmd, true, Utc::now()).unwrap_err(),
            OrderError::NoItems
        );
    }

    #[test]
    fn test_delivered_completes_payment() {
        let placed_at = Utc::now();
        let mut order = Order::place(command("cash-on-delivery"), true, placed_at).unwrap();
        let delivered_at = placed_at + Duration::days(3);

        assert!(order.transition_to(OrderStatus::Delivered, delivered_at).unwrap());
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.payment_status(), PaymentStatus::Completed);
        assert_eq!(order.delivered_at(), Some(delivered_at));
    }

    #[test]
    fn test_non_terminal_statuses_are_unordered() {
        let now = Utc::now();
        let mut order = Order::place(command("card"), true, now).unwrap();
        order.transition_to(OrderStatus::Shipped, now).unwrap();
        order.transition_to(OrderStatus::Placed, now).unwrap();
        assert_eq!(order.status(), OrderStatus::Placed);
        assert!(!order.transition_to(OrderStatus::Placed, now).unwrap());
    }

    #[test]
    fn test_cancel_is_idempotent_and_terminal() {
        let now = Utc::now();
        let mut order = Order::place(command("card"), true, now).unwrap();

        assert!(order.cancel(now));
        assert!(!order.cancel(now));
        assert_eq!(order.cancelled_at(), Some(now));

        let err = order.transition_to(OrderStatus::Shipped, now).unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidStateTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Shipped
            }
        );
        assert!(!order.transition_to(OrderStatus::Cancelled, now).unwrap());
    }

    #[test]
    fn test_transition_into_cancelled_cancels() {
        let now = Utc::now();
        let mut order = Order::place(command("card"), true, now).unwrap();
        assert!(order.transition_to(OrderStatus::Cancelled, now).unwrap());
        assert!(order.is_cancelled());
        assert_eq!(order.cancelled_at(), Some(now));
    }

    #[test]
    fn test_attach_tracking() {
        let now = Utc::now();
        let mut order = Order::place(command("card"), true, now).unwrap();
        assert_eq!(
            order.attach_tracking("  ", now),
            Err(OrderError::EmptyTrackingNumber)
        );
        order.attach_tracking("TRK123", now).unwrap();
        assert_eq!(order.tracking_number(), Some("TRK123"));
    }

    #[test]
    fn test_serialization_round_trip_keeps_state() {
        let mut order = Order::place(command("card"), true, Utc::now()).unwrap();
        order.set_version(4);
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
