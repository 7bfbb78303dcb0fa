//! Domain model for the storefront order core.
//!
//! This crate is pure data and rules, with no I/O:
//! - Catalog products with closed attribute sets, stock and reviews
//! - Orders with line-item snapshots, pricing and the status lifecycle
//! - Money in minor units
//! - Read-only user profiles used for enrichment

pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod user;

pub use catalog::{
    Badge, Category, Color, Material, NewProduct, Product, ProductError, ProductPatch,
    ProductRecord, Review,
};
pub use error::{DomainError, ParseValueError};
pub use money::Money;
pub use order::{
    LineItem, Order, OrderError, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus,
    PlaceOrder, PriceBreakdown, ShippingAddress, UpdateOrderStatus,
};
pub use user::{UserProfile, UserRole};

pub use common::{OrderId, ProductId, UserId};
