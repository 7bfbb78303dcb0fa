//! Domain error types.

use thiserror::Error;

use crate::catalog::ProductError;
use crate::order::OrderError;

/// A string that does not name a member of a closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: '{value}'")]
pub struct ParseValueError {
    /// The field being parsed, e.g. `"category"`.
    pub field: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseValueError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A product invariant was violated.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// An order invariant was violated.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An enumerated field held an unknown value.
    #[error(transparent)]
    InvalidValue(#[from] ParseValueError),
}
