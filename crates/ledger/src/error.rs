//! Ledger error types.

use common::{OrderId, ProductId};
use domain::{DomainError, OrderError};
use store::StoreError;
use thiserror::Error;

/// Stable classification of a ledger failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InsufficientStock,
    Validation,
    Conflict,
    Storage,
}

impl ErrorKind {
    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Order not found. Holds the id or order number looked up.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A line item references a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A line item asked for more than is on hand.
    #[error(
        "Insufficient stock for {product_name} ({product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// Input rejected before anything was touched.
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),

    /// Another writer updated the order first.
    #[error("Order {0} was modified concurrently")]
    ConcurrentModification(OrderId),

    /// The order was cancelled but some line items could not be restocked.
    #[error("Order {order_id} cancelled but stock release failed for: {failed:?}")]
    ReleaseIncomplete {
        order_id: OrderId,
        failed: Vec<ProductId>,
    },

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl LedgerError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::OrderNotFound(_) | LedgerError::ProductNotFound(_) => ErrorKind::NotFound,
            LedgerError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            LedgerError::Validation(DomainError::Order(OrderError::InvalidStateTransition {
                ..
            })) => ErrorKind::Conflict,
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::ConcurrentModification(_) => ErrorKind::Conflict,
            LedgerError::ReleaseIncomplete { .. } | LedgerError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<OrderError> for LedgerError {
    fn from(e: OrderError) -> Self {
        LedgerError::Validation(DomainError::Order(e))
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => LedgerError::OrderNotFound(id),
            StoreError::ProductNotFound(id) => LedgerError::ProductNotFound(id),
            StoreError::ConcurrencyConflict { order_id, .. } => {
                LedgerError::ConcurrentModification(order_id)
            }
            StoreError::Product(e) => LedgerError::Validation(DomainError::Product(e)),
            other => LedgerError::Storage(other),
        }
    }
}

/// Convenience type alias for ledger results.
pub type Result<T> = std::result::Result<T, LedgerError>;
