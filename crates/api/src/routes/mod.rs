//! HTTP handlers, one module per resource.

pub mod admin;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use crate::error::ApiError;

/// Parses a UUID path segment into a typed id.
pub(crate) fn parse_id<T: From<uuid::Uuid>>(kind: &str, id: &str) -> Result<T, ApiError> {
    uuid::Uuid::parse_str(id)
        .map(T::from)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {kind} id '{id}': {e}")))
}
