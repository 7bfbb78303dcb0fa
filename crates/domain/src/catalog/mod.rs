//! Catalog products, their attributes and reviews.

mod attributes;
mod product;

pub use attributes::{Badge, Category, Color, Material};
pub use product::{
    MAX_RATING, MIN_RATING, NewProduct, Product, ProductPatch, ProductRecord, Review,
};

use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    /// A required text field was empty.
    #[error("Product {field} is required")]
    MissingField { field: &'static str },

    /// A price field was below zero.
    #[error("Invalid {field}: {cents} (must not be negative)")]
    NegativePrice { field: &'static str, cents: i64 },

    /// Review rating outside `1..=5`.
    #[error("Invalid rating: {rating} (must be between 1 and 5)")]
    InvalidRating { rating: u8 },

    /// Not enough units on hand for a reservation.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// A release would overflow the stock counter.
    #[error("Stock overflow: {current} + {added}")]
    StockOverflow { current: u32, added: u32 },
}
