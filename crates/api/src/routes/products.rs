//! Catalog administration and review endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use domain::{
    Badge, Category, Color, DomainError, Material, Money, NewProduct, Product, ProductPatch,
    Review,
};
use serde::{Deserialize, Serialize};
use store::{ProductQuery, Storage};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub old_price_cents: i64,
    pub category: Category,
    pub material: Material,
    pub color: Color,
    #[serde(default)]
    pub badge: Badge,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub old_price_cents: Option<i64>,
    pub category: Option<Category>,
    pub material: Option<Material>,
    pub color: Option<Color>,
    pub badge: Option<Badge>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
}

#[derive(Deserialize)]
pub struct SetStockRequest {
    pub stock: u32,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub reviewer_name: String,
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub old_price_cents: i64,
    pub category: Category,
    pub material: Material,
    pub color: Color,
    pub badge: Badge,
    pub images: Vec<String>,
    pub stock: u32,
    pub rating: f64,
    pub total_reviews: u32,
    pub reviews: Vec<Review>,
    pub featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price_cents: product.price.cents(),
            old_price_cents: product.old_price.cents(),
            category: product.category,
            material: product.material,
            color: product.color,
            badge: product.badge,
            images: product.images.clone(),
            stock: product.stock(),
            rating: product.rating(),
            total_reviews: product.total_reviews(),
            reviews: product.reviews().to_vec(),
            featured: product.featured,
            is_active: product.is_active(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        ProductPatch {
            name: req.name,
            description: req.description,
            price: req.price_cents.map(Money::from_cents),
            old_price: req.old_price_cents.map(Money::from_cents),
            category: req.category,
            material: req.material,
            color: req.color,
            badge: req.badge,
            images: req.images,
            featured: req.featured,
        }
    }
}

// -- Handlers --

/// POST /products: add a product to the catalog.
#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = Product::create(NewProduct {
        name: req.name,
        description: req.description,
        price: Money::from_cents(req.price_cents),
        old_price: Money::from_cents(req.old_price_cents),
        category: req.category,
        material: req.material,
        color: req.color,
        badge: req.badge,
        images: req.images,
        stock: req.stock,
        featured: req.featured,
    })
    .map_err(DomainError::from)?;

    state.storage.insert_product(product.clone()).await?;
    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

/// GET /products: list active products, optionally by category or featured.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let mut filter = ProductQuery::new();
    if let Some(category) = query.category.as_deref() {
        let category: Category = category.parse().map_err(DomainError::from)?;
        filter = filter.category(category);
    }
    if query.featured {
        filter = filter.featured();
    }
    if query.include_inactive {
        filter = filter.include_inactive();
    }
    if let Some(limit) = query.limit {
        filter = filter.limit(limit);
    }

    let products = state.storage.list_products(filter).await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = parse_id::<ProductId>("product", &id)?;
    let product = state
        .storage
        .get_product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(ProductResponse::from(&product)))
}

/// PATCH /products/{id}: update descriptive fields.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = parse_id::<ProductId>("product", &id)?;
    let product = state
        .storage
        .update_product(product_id, ProductPatch::from(req))
        .await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// PUT /products/{id}/stock: overwrite the stock counter.
#[tracing::instrument(skip(state, req), fields(stock = req.stock))]
pub async fn set_stock<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<SetStockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = parse_id::<ProductId>("product", &id)?;
    let product = state.storage.set_stock(product_id, req.stock).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// DELETE /products/{id}: soft delete.
#[tracing::instrument(skip(state))]
pub async fn deactivate<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = parse_id::<ProductId>("product", &id)?;
    let product = state.storage.deactivate_product(product_id).await?;
    tracing::info!(%product_id, "product deactivated");
    Ok(Json(ProductResponse::from(&product)))
}

/// POST /products/{id}/reviews: append a review and return the product with
/// its recomputed rating.
#[tracing::instrument(skip(state, req), fields(rating = req.rating))]
pub async fn add_review<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product_id = parse_id::<ProductId>("product", &id)?;
    let mut review =
        Review::new(req.rating, req.comment, req.reviewer_name).map_err(DomainError::from)?;
    if let Some(user_id) = req.user_id.as_deref() {
        review = review.by_user(parse_id::<UserId>("user", user_id)?);
    }

    let product = state.storage.append_review(product_id, review).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}
