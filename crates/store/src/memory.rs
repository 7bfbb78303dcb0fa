use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Order, OrderNumber, Product, ProductError, ProductPatch, Review, UserProfile};
use tokio::sync::RwLock;

use crate::{
    CatalogStore, OrderQuery, OrderStore, ProductQuery, Result, StoreError, UserDirectory,
};

/// In-memory storage backend.
///
/// Provides the same interface as the PostgreSQL backend. Each map sits
/// behind its own lock; holding the write lock for the whole
/// check-and-decrement makes `reserve` atomic.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryStorage {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all products, orders and users.
    pub async fn clear(&self) {
        self.products.write().await.clear();
        self.orders.write().await.clear();
        self.users.write().await.clear();
    }

    async fn modify_product<T>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut Product) -> Result<T> + Send,
    ) -> Result<T> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        f(product)
    }
}

#[async_trait]
impl CatalogStore for InMemoryStorage {
    async fn insert_product(&self, product: Product) -> Result<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut matching: Vec<_> = products
            .values()
            .filter(|p| {
                if !query.include_inactive && !p.is_active() {
                    return false;
                }
                if let Some(category) = query.category
                    && p.category != category
                {
                    return false;
                }
                if let Some(featured) = query.featured
                    && p.featured != featured
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn count_products(&self) -> Result<u64> {
        Ok(self.products.read().await.len() as u64)
    }

    async fn low_stock_products(&self, threshold: u32) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut low: Vec<_> = products
            .values()
            .filter(|p| p.stock() < threshold)
            .cloned()
            .collect();
        low.sort_by(|a, b| a.stock().cmp(&b.stock()).then_with(|| a.name.cmp(&b.name)));
        Ok(low)
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        self.modify_product(id, |product| {
            product.apply_patch(patch)?;
            Ok(product.clone())
        })
        .await
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product> {
        self.modify_product(id, |product| {
            product.set_stock(stock);
            Ok(product.clone())
        })
        .await
    }

    async fn deactivate_product(&self, id: ProductId) -> Result<Product> {
        self.modify_product(id, |product| {
            product.deactivate();
            Ok(product.clone())
        })
        .await
    }

    async fn reserve(&self, id: ProductId, quantity: u32) -> Result<u32> {
        self.modify_product(id, |product| {
            product.reserve(quantity).map_err(|e| match e {
                ProductError::InsufficientStock {
                    requested,
                    available,
                } => StoreError::InsufficientStock {
                    product_id: id,
                    requested,
                    available,
                },
                other => StoreError::Product(other),
            })
        })
        .await
    }

    async fn release(&self, id: ProductId, quantity: u32) -> Result<u32> {
        self.modify_product(id, |product| {
            product.release(quantity).map_err(|e| match e {
                ProductError::StockOverflow { added, .. } => StoreError::StockOverflow {
                    product_id: id,
                    added,
                },
                other => StoreError::Product(other),
            })
        })
        .await
    }

    async fn append_review(&self, id: ProductId, review: Review) -> Result<Product> {
        self.modify_product(id, |product| {
            product.add_review(review);
            Ok(product.clone())
        })
        .await
    }
}

#[async_trait]
impl OrderStore for InMemoryStorage {
    async fn insert_order(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if let Some(existing) = orders.get(&order.id()) {
            return Err(StoreError::ConcurrencyConflict {
                order_id: order.id(),
                expected: 0,
                actual: existing.version(),
            });
        }
        order.set_version(1);
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn get_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|o| o.order_number() == number)
            .cloned())
    }

    async fn update_order(&self, mut order: Order, expected_version: u64) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order_id = order.id();
        let current = orders
            .get(&order_id)
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;

        if current.version() != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                order_id,
                expected: expected_version,
                actual: current.version(),
            });
        }

        order.set_version(expected_version + 1);
        orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders
            .values()
            .filter(|o| {
                if let Some(user_id) = query.user_id
                    && o.user_id() != Some(user_id)
                {
                    return false;
                }
                if let Some(from) = query.created_from
                    && o.created_at() < from
                {
                    return false;
                }
                if let Some(to) = query.created_to
                    && o.created_at() > to
                {
                    return false;
                }
                !(query.exclude_cancelled && o.is_cancelled())
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStorage {
    async fn upsert_user(&self, user: UserProfile) -> Result<()> {
        self.users.write().await.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn count_customers(&self) -> Result<u64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.is_customer()).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use domain::{
        Badge, Category, Color, LineItem, Material, Money, NewProduct, OrderStatus,
        PaymentMethod, PlaceOrder, ShippingAddress,
    };

    use super::*;

    fn product(name: &str, stock: u32) -> Product {
        Product::create(NewProduct {
            name: name.to_string(),
            description: "Everyday carry".to_string(),
            price: Money::from_major(100),
            old_price: Money::zero(),
            category: Category::Backpack,
            material: Material::Nylon,
            color: Color::Black,
            badge: Badge::New,
            images: vec![],
            stock,
            featured: false,
        })
        .unwrap()
    }

    fn order_for(user_id: Option<UserId>, product_id: ProductId, at: chrono::DateTime<Utc>) -> Order {
        let cmd = PlaceOrder::new(
            user_id,
            vec![LineItem::new(product_id, "Bag", Money::from_major(100), 1)],
            ShippingAddress {
                full_name: None,
                phone: None,
                street: "1 Main St".to_string(),
                city: "Pune".to_string(),
                state: "MH".to_string(),
                pincode: "411001".to_string(),
                country: "India".to_string(),
            },
            PaymentMethod::new("card"),
        );
        Order::place(cmd, true, at).unwrap()
    }

    #[tokio::test]
    async fn reserve_decrements_and_rejects_overdraw() {
        let store = InMemoryStorage::new();
        let p = product("Daypack", 5);
        let id = p.id;
        store.insert_product(p).await.unwrap();

        assert_eq!(store.reserve(id, 2).await.unwrap(), 3);

        let err = store.reserve(id, 4).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            }
        ));
        assert_eq!(store.get_product(id).await.unwrap().unwrap().stock(), 3);
    }

    #[tokio::test]
    async fn reserve_unknown_product_is_not_found() {
        let store = InMemoryStorage::new();
        let id = ProductId::new();
        assert!(matches!(
            store.reserve(id, 1).await,
            Err(StoreError::ProductNotFound(missing)) if missing == id
        ));
        assert!(matches!(
            store.release(id, 1).await,
            Err(StoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_reservations_never_overdraw() {
        let store = InMemoryStorage::new();
        let p = product("Limited", 3);
        let id = p.id;
        store.insert_product(p).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.reserve(id, 1).await })
            })
            .collect();

        let mut ok = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(StoreError::InsufficientStock { .. }) => insufficient += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(ok, 3);
        assert_eq!(insufficient, 7);
        assert_eq!(store.get_product(id).await.unwrap().unwrap().stock(), 0);
    }

    #[tokio::test]
    async fn low_stock_sorted_ascending() {
        let store = InMemoryStorage::new();
        for (name, stock) in [("A", 9), ("B", 2), ("C", 10), ("D", 0)] {
            store.insert_product(product(name, stock)).await.unwrap();
        }
        let low = store.low_stock_products(10).await.unwrap();
        let stocks: Vec<_> = low.iter().map(|p| p.stock()).collect();
        assert_eq!(stocks, vec![0, 2, 9]);
    }

    #[tokio::test]
    async fn deactivated_products_leave_listings_but_stay_loadable() {
        let store = InMemoryStorage::new();
        let p = product("Old", 1);
        let id = p.id;
        store.insert_product(p).await.unwrap();
        store.insert_product(product("New", 1)).await.unwrap();

        store.deactivate_product(id).await.unwrap();

        let listed = store.list_products(ProductQuery::new()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "New");
        assert!(!store.get_product(id).await.unwrap().unwrap().is_active());
        assert_eq!(store.count_products().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_order_checks_version() {
        let store = InMemoryStorage::new();
        let order = order_for(None, ProductId::new(), Utc::now());
        let stored = store.insert_order(order).await.unwrap();
        assert_eq!(stored.version(), 1);

        let mut first = stored.clone();
        first.transition_to(OrderStatus::Shipped, Utc::now()).unwrap();
        let first = store.update_order(first, 1).await.unwrap();
        assert_eq!(first.version(), 2);

        let mut stale = stored;
        stale.cancel(Utc::now());
        let err = store.update_order(stale, 1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConcurrencyConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn query_orders_newest_first_with_filters() {
        let store = InMemoryStorage::new();
        let user = UserId::new();
        let now = Utc::now();

        let old = order_for(Some(user), ProductId::new(), now - Duration::days(10));
        let recent = order_for(Some(user), ProductId::new(), now - Duration::days(1));
        let other = order_for(None, ProductId::new(), now);
        let old_id = old.id();
        let recent_id = recent.id();

        for order in [old, recent, other] {
            store.insert_order(order).await.unwrap();
        }

        let mine = store.query_orders(OrderQuery::for_user(user)).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![recent_id, old_id]);

        let last_week = store
            .query_orders(OrderQuery::new().created_from(now - Duration::days(7)))
            .await
            .unwrap();
        assert_eq!(last_week.len(), 2);

        let limited = store.query_orders(OrderQuery::new().limit(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn count_customers_ignores_admins() {
        let store = InMemoryStorage::new();
        store
            .upsert_user(UserProfile::new("Asha", "asha@example.com"))
            .await
            .unwrap();
        store
            .upsert_user(UserProfile::new("Root", "root@example.com").admin())
            .await
            .unwrap();
        assert_eq!(store.count_customers().await.unwrap(), 1);
    }
}
