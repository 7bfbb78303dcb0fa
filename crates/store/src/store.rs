use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Order, OrderNumber, Product, ProductPatch, Review, UserProfile};

use crate::{OrderQuery, ProductQuery, Result};

/// Product records and their stock counters.
///
/// All implementations must be thread-safe (Send + Sync). Every mutation is
/// atomic per product.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Stores a new product.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Loads a product by id, including soft-deleted ones.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Loads every product in `ids` that exists. Order is unspecified.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Lists products matching `query`, newest first.
    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>>;

    /// Counts all products, active or not.
    async fn count_products(&self) -> Result<u64>;

    /// Products with stock strictly below `threshold`, lowest stock first.
    async fn low_stock_products(&self, threshold: u32) -> Result<Vec<Product>>;

    /// Applies a descriptive patch. Stock is left untouched.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product>;

    /// Overwrites the stock level.
    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product>;

    /// Soft deletes a product.
    async fn deactivate_product(&self, id: ProductId) -> Result<Product>;

    /// Decrements stock by `quantity` only if at least that much is on hand.
    ///
    /// This is a single conditional update: concurrent reservations against
    /// the same product can never overdraw it. Returns the remaining stock.
    async fn reserve(&self, id: ProductId, quantity: u32) -> Result<u32>;

    /// Increments stock by `quantity`. Returns the new stock.
    async fn release(&self, id: ProductId, quantity: u32) -> Result<u32>;

    /// Appends a review and recomputes the rating in the same write.
    async fn append_review(&self, id: ProductId, review: Review) -> Result<Product>;
}

/// Order records with optimistic concurrency.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a newly placed order. Returns it at version 1.
    async fn insert_order(&self, order: Order) -> Result<Order>;

    /// Loads an order by storage id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Loads an order by its public order number.
    async fn get_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>>;

    /// Replaces an order if its stored version is still `expected_version`.
    ///
    /// Fails with `ConcurrencyConflict` otherwise. Returns the order at its
    /// new version.
    async fn update_order(&self, order: Order, expected_version: u64) -> Result<Order>;

    /// Lists orders matching `query`, newest first.
    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>>;
}

/// Read access to registered users. Accounts are managed elsewhere.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Registers or replaces a user profile.
    async fn upsert_user(&self, user: UserProfile) -> Result<()>;

    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>>;

    /// Loads every user in `ids` that exists.
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>>;

    /// Counts shopper accounts (role `user`).
    async fn count_customers(&self) -> Result<u64>;
}

/// A complete storage backend.
///
/// The HTTP layer and binaries are generic over this single parameter.
pub trait Storage: CatalogStore + OrderStore + UserDirectory + Clone + 'static {}

impl<T> Storage for T where T: CatalogStore + OrderStore + UserDirectory + Clone + 'static {}
