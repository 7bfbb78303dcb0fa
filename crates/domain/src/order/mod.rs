//! Orders, their line items and status lifecycle.

mod aggregate;
mod commands;
mod status;
mod value_objects;

pub use aggregate::Order;
pub use commands::{PlaceOrder, UpdateOrderStatus};
pub use status::{OrderStatus, PaymentStatus};
pub use value_objects::{LineItem, OrderNumber, PaymentMethod, PriceBreakdown, ShippingAddress};

use common::ProductId;
use thiserror::Error;

use crate::money::Money;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Invalid price.
    #[error("Invalid price for product {product_id}: {price} (must not be negative)")]
    InvalidPrice { product_id: ProductId, price: i64 },

    /// A required address field was empty.
    #[error("Shipping address {field} is required")]
    InvalidShippingAddress { field: &'static str },

    /// Payment method was empty.
    #[error("Payment method is required")]
    MissingPaymentMethod,

    /// A monetary field was below zero.
    #[error("Invalid {field}: {cents} (must not be negative)")]
    NegativeAmount { field: &'static str, cents: i64 },

    /// A computed amount does not fit in the money range.
    #[error("Amount overflow while computing {field}")]
    AmountOverflow { field: &'static str },

    /// A supplied total does not match the one computed from the order.
    #[error("Inconsistent {field}: expected {expected}, got {actual}")]
    TotalsMismatch {
        field: &'static str,
        expected: Money,
        actual: Money,
    },

    /// Status change not allowed from the current status.
    #[error("Invalid state transition: cannot move from {from} to {to}")]
    InvalidStateTransition { from: OrderStatus, to: OrderStatus },

    /// Tracking number was empty.
    #[error("Tracking number must not be empty")]
    EmptyTrackingNumber,
}
