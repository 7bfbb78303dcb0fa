use common::{OrderId, ProductId};
use domain::{ParseValueError, ProductError};
use thiserror::Error;

/// Errors that can occur when interacting with storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist. Holds the id or order number looked up.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A conditional stock decrement was refused.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// A release would push stock past the counter's range.
    #[error("Stock overflow for product {product_id}: cannot add {added}")]
    StockOverflow { product_id: ProductId, added: u32 },

    /// Another writer updated the order first.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// A product update broke a product invariant.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// A stored column held a value outside its closed set.
    #[error("Invalid stored value: {0}")]
    InvalidData(#[from] ParseValueError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
