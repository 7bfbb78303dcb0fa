//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{ProductId, UserId};
use domain::{
    Badge, Category, Color, LineItem, Material, Money, NewProduct, Order, OrderStatus,
    PaymentMethod, PlaceOrder, Product, ProductPatch, Review, ShippingAddress, UserProfile,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    CatalogStore, OrderQuery, OrderStore, PostgresStorage, ProductQuery, StoreError,
    UserDirectory,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_catalog_and_orders.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStorage {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE products, orders, users")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStorage::new(pool)
}

fn test_product(name: &str, stock: u32) -> Product {
    Product::create(NewProduct {
        name: name.to_string(),
        description: "Waxed canvas messenger".to_string(),
        price: Money::from_major(100),
        old_price: Money::from_major(120),
        category: Category::Messenger,
        material: Material::Canvas,
        color: Color::Green,
        badge: Badge::Hot,
        images: vec!["https://img.example.com/1.jpg".to_string()],
        stock,
        featured: true,
    })
    .unwrap()
}

fn test_order(user_id: Option<UserId>, product_id: ProductId, quantity: u32) -> Order {
    let cmd = PlaceOrder::new(
        user_id,
        vec![LineItem::new(product_id, "Messenger", Money::from_major(100), quantity)],
        ShippingAddress {
            full_name: Some("Ravi Kumar".to_string()),
            phone: Some("9999999999".to_string()),
            street: "4 Park Street".to_string(),
            city: "Kolkata".to_string(),
            state: "WB".to_string(),
            pincode: "700016".to_string(),
            country: "India".to_string(),
        },
        PaymentMethod::cash_on_delivery(),
    );
    Order::place(cmd, true, Utc::now()).unwrap()
}

#[tokio::test]
#[serial]
async fn insert_and_load_product() {
    let store = get_test_store().await;
    let product = test_product("Field Messenger", 12);
    let id = product.id;

    store.insert_product(product.clone()).await.unwrap();

    let loaded = store.get_product(id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Field Messenger");
    assert_eq!(loaded.stock(), 12);
    assert_eq!(loaded.category, Category::Messenger);
    assert_eq!(loaded.badge, Badge::Hot);
    assert_eq!(loaded.images, product.images);
    assert!(loaded.is_active());
}

#[tokio::test]
#[serial]
async fn reserve_is_conditional() {
    let store = get_test_store().await;
    let product = test_product("Messenger", 5);
    let id = product.id;
    store.insert_product(product).await.unwrap();

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

    assert!(matches!(
        store.reserve(ProductId::new(), 1).await,
        Err(StoreError::ProductNotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn concurrent_reservations_succeed_exactly_stock_times() {
    let store = get_test_store().await;
    let product = test_product("Drop", 4);
    let id = product.id;
    store.insert_product(product).await.unwrap();

    let attempts = (0..12).map(|_| {
        let store = store.clone();
        async move { store.reserve(id, 1).await }
    });
    let results = futures_util::future::join_all(attempts).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::InsufficientStock { .. })))
        .count();

    assert_eq!(succeeded, 4);
    assert_eq!(refused, 8);
    assert_eq!(store.get_product(id).await.unwrap().unwrap().stock(), 0);
}

#[tokio::test]
#[serial]
async fn release_restores_stock() {
    let store = get_test_store().await;
    let product = test_product("Messenger", 10);
    let id = product.id;
    store.insert_product(product).await.unwrap();

    store.reserve(id, 3).await.unwrap();
    assert_eq!(store.release(id, 3).await.unwrap(), 10);
    assert!(matches!(
        store.release(ProductId::new(), 1).await,
        Err(StoreError::ProductNotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn append_review_recomputes_rating() {
    let store = get_test_store().await;
    let product = test_product("Messenger", 1);
    let id = product.id;
    store.insert_product(product).await.unwrap();

    store
        .append_review(id, Review::new(4, "Solid", "Meera").unwrap())
        .await
        .unwrap();
    let updated = store
        .append_review(id, Review::new(5, "Great", "Kiran").unwrap())
        .await
        .unwrap();
    assert_eq!(updated.rating(), 4.5);
    assert_eq!(updated.total_reviews(), 2);

    let loaded = store.get_product(id).await.unwrap().unwrap();
    assert_eq!(loaded.rating(), 4.5);
    assert_eq!(loaded.reviews().len(), 2);
}

#[tokio::test]
#[serial]
async fn patch_stock_and_soft_delete() {
    let store = get_test_store().await;
    let product = test_product("Messenger", 20);
    let id = product.id;
    store.insert_product(product).await.unwrap();

    let patched = store
        .update_product(
            id,
            ProductPatch {
                price: Some(Money::from_major(90)),
                badge: Some(Badge::Sale),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.price, Money::from_major(90));
    assert_eq!(patched.stock(), 20);

    assert_eq!(store.set_stock(id, 3).await.unwrap().stock(), 3);
    let low = store.low_stock_products(10).await.unwrap();
    assert_eq!(low.len(), 1);

    store.deactivate_product(id).await.unwrap();
    assert!(store.list_products(ProductQuery::new()).await.unwrap().is_empty());
    assert_eq!(
        store
            .list_products(ProductQuery::new().include_inactive())
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(store.count_products().await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn order_round_trip_and_lookup_by_number() {
    let store = get_test_store().await;
    let order = test_order(Some(UserId::new()), ProductId::new(), 2);
    let number = order.order_number().clone();

    let stored = store.insert_order(order).await.unwrap();
    assert_eq!(stored.version(), 1);

    let by_id = store.get_order(stored.id()).await.unwrap().unwrap();
    assert_eq!(by_id, stored);

    let by_number = store.get_order_by_number(&number).await.unwrap().unwrap();
    assert_eq!(by_number.id(), stored.id());
}

#[tokio::test]
#[serial]
async fn stale_order_update_is_rejected() {
    let store = get_test_store().await;
    let stored = store
        .insert_order(test_order(None, ProductId::new(), 1))
        .await
        .unwrap();

    let mut delivered = stored.clone();
    delivered
        .transition_to(OrderStatus::Delivered, Utc::now())
        .unwrap();
    let delivered = store.update_order(delivered, 1).await.unwrap();
    assert_eq!(delivered.version(), 2);

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

    let loaded = store.get_order(delivered.id()).await.unwrap().unwrap();
    assert_eq!(loaded.status(), OrderStatus::Delivered);
}

#[tokio::test]
#[serial]
async fn query_orders_filters() {
    let store = get_test_store().await;
    let user = UserId::new();

    let mine = store
        .insert_order(test_order(Some(user), ProductId::new(), 1))
        .await
        .unwrap();
    let other = store
        .insert_order(test_order(None, ProductId::new(), 1))
        .await
        .unwrap();

    let mut cancelled = other.clone();
    cancelled.cancel(Utc::now());
    store.update_order(cancelled, other.version()).await.unwrap();

    let for_user = store.query_orders(OrderQuery::for_user(user)).await.unwrap();
    assert_eq!(for_user.len(), 1);
    assert_eq!(for_user[0].id(), mine.id());

    let active = store
        .query_orders(OrderQuery::new().exclude_cancelled())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    let future = store
        .query_orders(OrderQuery::new().created_from(Utc::now() + Duration::days(1)))
        .await
        .unwrap();
    assert!(future.is_empty());
}

#[tokio::test]
#[serial]
async fn user_directory_counts_customers() {
    let store = get_test_store().await;
    let shopper = UserProfile::new("Anil", "anil@example.com").with_phone("12345");
    let shopper_id = shopper.id;

    store.upsert_user(shopper).await.unwrap();
    store
        .upsert_user(UserProfile::new("Admin", "admin@example.com").admin())
        .await
        .unwrap();

    assert_eq!(store.count_customers().await.unwrap(), 1);
    let loaded = store.get_user(shopper_id).await.unwrap().unwrap();
    assert_eq!(loaded.phone.as_deref(), Some("12345"));
    assert_eq!(store.get_users(&[shopper_id, UserId::new()]).await.unwrap().len(), 1);
}
