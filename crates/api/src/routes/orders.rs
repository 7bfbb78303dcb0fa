//! Order placement, lifecycle and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{
    DomainError, LineItem, Money, Order, OrderStatus, PaymentMethod, PlaceOrder, PriceBreakdown,
    ShippingAddress, UpdateOrderStatus,
};
use ledger::{OrderFilter, OwnedOrder, OwnerSummary, with_owners};
use serde::{Deserialize, Serialize};
use store::Storage;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: Option<String>,
    pub items: Vec<LineItemRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    /// Computed from the items when absent.
    pub pricing: Option<PricingRequest>,
    pub coupon_code: Option<String>,
    pub order_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct LineItemRequest {
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
    pub image: Option<String>,
}

#[derive(Deserialize)]
pub struct PricingRequest {
    pub subtotal_cents: i64,
    #[serde(default)]
    pub shipping_charges_cents: i64,
    #[serde(default)]
    pub tax_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    pub total_amount_cents: i64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub tracking_number: Option<String>,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub owner: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerSummary>,
    pub items: Vec<LineItemResponse>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub subtotal_cents: i64,
    pub shipping_charges_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_amount_cents: i64,
    pub coupon_code: Option<String>,
    pub order_notes: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub tracking_number: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
    pub image: Option<String>,
    pub total_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let pricing = order.pricing();
        Self {
            id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            user_id: order.user_id().map(|id| id.to_string()),
            owner: None,
            items: order
                .items()
                .iter()
                .map(|item| LineItemResponse {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    price_cents: item.price.cents(),
                    quantity: item.quantity,
                    image: item.image.clone(),
                    total_cents: item.price.saturating_mul(item.quantity).cents(),
                })
                .collect(),
            shipping_address: order.shipping_address().clone(),
            payment_method: order.payment_method().to_string(),
            subtotal_cents: pricing.subtotal.cents(),
            shipping_charges_cents: pricing.shipping_charges.cents(),
            tax_cents: pricing.tax.cents(),
            discount_cents: pricing.discount.cents(),
            total_amount_cents: order.total_amount().cents(),
            coupon_code: order.coupon_code().map(String::from),
            order_notes: order.order_notes().map(String::from),
            status: order.status().to_string(),
            payment_status: order.payment_status().to_string(),
            tracking_number: order.tracking_number().map(String::from),
            delivered_at: order.delivered_at(),
            cancelled_at: order.cancelled_at(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            version: order.version(),
        }
    }
}

impl From<OwnedOrder> for OrderResponse {
    fn from(owned: OwnedOrder) -> Self {
        let mut response = OrderResponse::from(&owned.order);
        response.owner = owned.owner;
        response
    }
}

impl PlaceOrderRequest {
    fn into_command(self) -> Result<PlaceOrder, ApiError> {
        let user_id = self
            .user_id
            .as_deref()
            .map(|id| parse_id::<UserId>("user", id))
            .transpose()?;

        let items = self
            .items
            .into_iter()
            .map(|item| {
                let product_id = parse_id::<ProductId>("product", &item.product_id)?;
                let line = LineItem::new(
                    product_id,
                    item.name,
                    Money::from_cents(item.price_cents),
                    item.quantity,
                );
                Ok(match item.image {
                    Some(image) => line.with_image(image),
                    None => line,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let mut command = PlaceOrder::new(
            user_id,
            items,
            self.shipping_address,
            PaymentMethod::new(self.payment_method),
        );
        if let Some(pricing) = self.pricing {
            command = command.with_pricing(PriceBreakdown {
                subtotal: Money::from_cents(pricing.subtotal_cents),
                shipping_charges: Money::from_cents(pricing.shipping_charges_cents),
                tax: Money::from_cents(pricing.tax_cents),
                discount: Money::from_cents(pricing.discount_cents),
                total_amount: Money::from_cents(pricing.total_amount_cents),
            });
        }
        if let Some(code) = self.coupon_code {
            command = command.with_coupon(code);
        }
        if let Some(notes) = self.order_notes {
            command = command.with_notes(notes);
        }
        Ok(command)
    }
}

// -- Handlers --

/// POST /orders: reserve stock and record an order.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let command = req.into_command()?;
    let order = state.ledger.place_order(command).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders: list orders newest first, with owner details.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let owner = query
        .owner
        .as_deref()
        .map(|id| parse_id::<UserId>("user", id))
        .transpose()?;

    let orders = state.ledger.list_orders(OrderFilter { owner }).await?;
    let owned = with_owners(state.storage.as_ref(), orders).await?;
    Ok(Json(owned.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}: load an order by storage id.
#[tracing::instrument(skip(state))]
pub async fn get<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_id::<OrderId>("order", &id)?;
    let order = state.ledger.get_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/number/{order_number}: load an order by its public number.
#[tracing::instrument(skip(state))]
pub async fn get_by_number<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.ledger.get_order_by_number(&order_number).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /orders/{id}/status: move an order along its lifecycle.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_id::<OrderId>("order", &id)?;
    let status: OrderStatus = req.status.parse().map_err(DomainError::from)?;

    let mut command = UpdateOrderStatus::new(order_id, status);
    if let Some(tracking_number) = req.tracking_number {
        command = command.with_tracking(tracking_number);
    }

    let order = state.ledger.update_status(command).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel: cancel an order and restore its stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_id::<OrderId>("order", &id)?;
    let order = state.ledger.cancel_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /users/{id}/orders: one user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn for_user<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user_id = parse_id::<UserId>("user", &id)?;
    let orders = state.ledger.orders_for_user(user_id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}
