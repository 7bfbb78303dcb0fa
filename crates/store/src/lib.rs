//! Storage for the storefront order core.
//!
//! Three stores sit behind async traits:
//! - [`CatalogStore`]: products, stock counters with atomic conditional
//!   decrement, reviews
//! - [`OrderStore`]: orders with optimistic version checks
//! - [`UserDirectory`]: read-only user profiles
//!
//! [`InMemoryStorage`] and [`PostgresStorage`] each implement all three, and
//! so satisfy the [`Storage`] bundle.

mod error;
mod memory;
mod postgres;
mod query;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStorage;
pub use postgres::PostgresStorage;
pub use query::{OrderQuery, ProductQuery};
pub use store::{CatalogStore, OrderStore, Storage, UserDirectory};
