//! Order commands.

use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{LineItem, OrderError, OrderStatus, PaymentMethod, PriceBreakdown, ShippingAddress};

/// Request to place an order.
///
/// `user_id` is absent for guest checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub user_id: Option<UserId>,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub pricing: PriceBreakdown,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub order_notes: Option<String>,
}

impl PlaceOrder {
    /// Creates a command whose pricing is computed from `items` with no
    /// shipping, tax or discount.
    ///
    /// If the items' totals overflow, pricing is left at zero and
    /// validation rejects the command.
    pub fn new(
        user_id: Option<UserId>,
        items: Vec<LineItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Self {
        let pricing = PriceBreakdown::for_items(
            &items,
            Default::default(),
            Default::default(),
            Default::default(),
        )
        .unwrap_or_default();
        Self {
            user_id,
            items,
            shipping_address,
            payment_method,
            pricing,
            coupon_code: None,
            order_notes: None,
        }
    }

    pub fn with_pricing(mut self, pricing: PriceBreakdown) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_coupon(mut self, code: impl Into<String>) -> Self {
        self.coupon_code = Some(code.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.order_notes = Some(notes.into());
        self
    }

    /// Checks everything that can be checked without touching stock.
    pub fn validate(&self, verify_totals: bool) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &self.items {
            item.validate()?;
        }
        self.shipping_address.validate()?;
        if self.payment_method.as_str().trim().is_empty() {
            return Err(OrderError::MissingPaymentMethod);
        }
        self.pricing.validate(&self.items, verify_totals)
    }
}

/// Request to move an order to a new status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrderStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

impl UpdateOrderStatus {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self {
            order_id,
            status,
            tracking_number: None,
        }
    }

    pub fn with_tracking(mut self, tracking_number: impl Into<String>) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self
    }
}
