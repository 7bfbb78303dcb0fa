use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{
    Money, Order, OrderNumber, OrderStatus, ParseValueError, Product, ProductPatch,
    ProductRecord, Review, UserProfile, UserRole,
};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CatalogStore, OrderQuery, OrderStore, ProductQuery, Result, StoreError, UserDirectory,
};

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, old_price_cents, category, \
     material, color, badge, images, stock, reviews, featured, is_active, created_at, updated_at";

const ORDER_COLUMNS: &str = "version, data";

/// PostgreSQL-backed storage.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new PostgreSQL store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let category: String = row.try_get("category")?;
        let material: String = row.try_get("material")?;
        let color: String = row.try_get("color")?;
        let badge: String = row.try_get("badge")?;
        let images: serde_json::Value = row.try_get("images")?;
        let reviews: serde_json::Value = row.try_get("reviews")?;

        let record = ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            old_price: Money::from_cents(row.try_get("old_price_cents")?),
            category: category.parse()?,
            material: material.parse()?,
            color: color.parse()?,
            badge: badge.parse()?,
            images: serde_json::from_value(images)?,
            stock: stock_from_row(&row)?,
            reviews: serde_json::from_value(reviews)?,
            featured: row.try_get("featured")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        };
        Ok(Product::from(record))
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let data: serde_json::Value = row.try_get("data")?;
        let version: i64 = row.try_get("version")?;
        let mut order: Order = serde_json::from_value(data)?;
        order.set_version(version as u64);
        Ok(order)
    }

    fn row_to_user(row: PgRow) -> Result<UserProfile> {
        let role: String = row.try_get("role")?;
        let role = match role.as_str() {
            "user" => UserRole::User,
            "admin" => UserRole::Admin,
            other => return Err(ParseValueError::new("role", other).into()),
        };
        Ok(UserProfile {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            role,
        })
    }

    /// Tells "no such product" apart from "not enough stock" after a refused
    /// conditional decrement.
    async fn reservation_failure(&self, id: ProductId, requested: u32) -> Result<StoreError> {
        let available: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(match available {
            None => StoreError::ProductNotFound(id),
            Some(read) => StoreError::InsufficientStock {
                product_id: id,
                requested,
                available: refused_availability(read, requested),
            },
        })
    }

    async fn update_product_returning(
        &self,
        id: ProductId,
        assignment: &str,
        stock: Option<u32>,
    ) -> Result<Product> {
        let sql = format!(
            "UPDATE products SET {assignment}, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let mut query = sqlx::query(&sql).bind(id.as_uuid());
        if let Some(stock) = stock {
            query = query.bind(i64::from(stock));
        }
        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;
        Self::row_to_product(row)
    }
}

/// The stock reading is taken after the refused UPDATE, so a concurrent
/// release can push it to `requested` or above. Report at most
/// `requested - 1`, which is what the UPDATE saw.
fn refused_availability(read: i64, requested: u32) -> u32 {
    u32::try_from(read)
        .unwrap_or(0)
        .min(requested.saturating_sub(1))
}

fn stock_from_row(row: &PgRow) -> Result<u32> {
    let stock: i64 = row.try_get("stock")?;
    u32::try_from(stock).map_err(|_| ParseValueError::new("stock", stock.to_string()).into())
}

#[async_trait]
impl CatalogStore for PostgresStorage {
    async fn insert_product(&self, product: Product) -> Result<()> {
        let images = serde_json::to_value(&product.images)?;
        let reviews = serde_json::to_value(product.reviews())?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, old_price_cents, category,
                material, color, badge, images, stock, reviews, rating, total_reviews, featured,
                is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.old_price.cents())
        .bind(product.category.as_str())
        .bind(product.material.as_str())
        .bind(product.color.as_str())
        .bind(product.badge.as_str())
        .bind(images)
        .bind(i64::from(product.stock()))
        .bind(reviews)
        .bind(product.rating())
        .bind(product.total_reviews() as i32)
        .bind(product.featured)
        .bind(product.is_active())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut param_count = 0;

        if !query.include_inactive {
            sql.push_str(" AND is_active");
        }
        if query.category.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category = ${param_count}"));
        }
        if query.featured.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND featured = ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at DESC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(category) = query.category {
            sqlx_query = sqlx_query.bind(category.as_str());
        }
        if let Some(featured) = query.featured {
            sqlx_query = sqlx_query.bind(featured);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn count_products(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn low_stock_products(&self, threshold: u32) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock < $1 ORDER BY stock ASC, name ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(threshold))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;
        let mut product = Self::row_to_product(row)?;
        product.apply_patch(patch)?;

        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, old_price_cents = $5,
                category = $6, material = $7, color = $8, badge = $9, images = $10,
                featured = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.old_price.cents())
        .bind(product.category.as_str())
        .bind(product.material.as_str())
        .bind(product.color.as_str())
        .bind(product.badge.as_str())
        .bind(serde_json::to_value(&product.images)?)
        .bind(product.featured)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product> {
        self.update_product_returning(id, "stock = $2", Some(stock)).await
    }

    async fn deactivate_product(&self, id: ProductId) -> Result<Product> {
        self.update_product_returning(id, "is_active = FALSE", None).await
    }

    async fn reserve(&self, id: ProductId, quantity: u32) -> Result<u32> {
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        match remaining {
            Some(remaining) => Ok(remaining as u32),
            None => {
                let err = self.reservation_failure(id, quantity).await?;
                tracing::debug!(product_id = %id, quantity, error = %err, "reservation refused");
                Err(err)
            }
        }
    }

    async fn release(&self, id: ProductId, quantity: u32) -> Result<u32> {
        let stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING stock
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("products_stock_range")
            {
                return StoreError::StockOverflow {
                    product_id: id,
                    added: quantity,
                };
            }
            StoreError::Database(e)
        })?;

        stock
            .map(|s| s as u32)
            .ok_or(StoreError::ProductNotFound(id))
    }

    async fn append_review(&self, id: ProductId, review: Review) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;
        let mut product = Self::row_to_product(row)?;
        product.add_review(review);

        sqlx::query(
            r#"
            UPDATE products
            SET reviews = $2, rating = $3, total_reviews = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(serde_json::to_value(product.reviews())?)
        .bind(product.rating())
        .bind(product.total_reviews() as i32)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(product)
    }
}

#[async_trait]
impl OrderStore for PostgresStorage {
    async fn insert_order(&self, mut order: Order) -> Result<Order> {
        order.set_version(1);
        let data = serde_json::to_value(&order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, user_id, status, payment_status, total_cents,
                created_at, updated_at, version, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.order_number().as_str())
        .bind(order.user_id().map(|u| u.as_uuid()))
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.total_amount().cents())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(1_i64)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::ConcurrencyConflict {
                    order_id: order.id(),
                    expected: 0,
                    actual: 1,
                };
            }
            StoreError::Database(e)
        })?;

        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn get_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1");
        let row = sqlx::query(&sql)
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn update_order(&self, mut order: Order, expected_version: u64) -> Result<Order> {
        let order_id = order.id();
        let next_version = expected_version + 1;
        order.set_version(next_version);
        let data = serde_json::to_value(&order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_status = $3, updated_at = $4, version = $5, data = $6
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.updated_at())
        .bind(next_version as i64)
        .bind(data)
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                    .bind(order_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;

            return Err(match actual {
                None => StoreError::OrderNotFound(order_id.to_string()),
                Some(actual) => StoreError::ConcurrencyConflict {
                    order_id,
                    expected: expected_version,
                    actual: actual as u64,
                },
            });
        }

        Ok(order)
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.user_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if query.created_from.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if query.created_to.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }
        if query.exclude_cancelled {
            param_count += 1;
            sql.push_str(&format!(" AND status <> ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at DESC, id");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(user_id) = query.user_id {
            sqlx_query = sqlx_query.bind(user_id.as_uuid());
        }
        if let Some(from) = query.created_from {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = query.created_to {
            sqlx_query = sqlx_query.bind(to);
        }
        if query.exclude_cancelled {
            sqlx_query = sqlx_query.bind(OrderStatus::Cancelled.as_str());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }
}

#[async_trait]
impl UserDirectory for PostgresStorage {
    async fn upsert_user(&self, user: UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, phone, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, email = EXCLUDED.email,
                phone = EXCLUDED.phone, role = EXCLUDED.role
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, name, email, phone, role FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_user).transpose()
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>> {
        let ids: Vec<Uuid> = ids.iter().map(UserId::as_uuid).collect();
        let rows = sqlx::query("SELECT id, name, email, phone, role FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn count_customers(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'user'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
