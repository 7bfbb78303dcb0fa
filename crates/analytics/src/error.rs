//! Analytics error types.

use domain::ParseValueError;
use thiserror::Error;

/// Errors that can occur while computing aggregates.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Reading orders, products or users failed.
    #[error("Storage error: {0}")]
    Store(#[from] store::StoreError),

    /// Unknown aggregation window name.
    #[error(transparent)]
    InvalidWindow(#[from] ParseValueError),
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
