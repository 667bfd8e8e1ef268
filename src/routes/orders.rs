//! Checkout, order and payment callback handlers.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{AppState, Payload};
use crate::auth::{Admin, Caller, SignedCallback};
use crate::domain::aggregates::{DeletedOrder, Order, OrderDetail, Transition};
use crate::domain::value_objects::OrderStatus;
use crate::error::{Result, ShopError};
use crate::services::{CheckoutLine, OrderPage};
use crate::store::Page;

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    #[validate]
    pub items: Vec<CheckoutItem>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallback {
    #[serde(default)]
    #[validate(length(min = 1, message = "Order ID is required"))]
    pub order_id: String,
}

/// Confirmed payment. `order_id` is the payment reference issued at checkout.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    #[serde(default)]
    #[validate(length(min = 1, message = "Order ID is required"))]
    pub order_id: String,
    #[validate(range(min = 0))]
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallbackResponse {
    pub message: String,
    pub order_id: String,
    pub status: OrderStatus,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub message: &'static str,
    pub order: Order,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub all: bool,
}

pub async fn checkout(State(s): State<AppState>, caller: Caller, Payload(r): Payload<CheckoutRequest>) -> Result<(StatusCode, Json<OrderDetail>)> {
    let lines: Vec<CheckoutLine> = r.items.into_iter()
        .map(|i| CheckoutLine { product_id: i.product_id, quantity: i.quantity })
        .collect();
    let detail = s.orders.place_order(&caller, &lines, r.shipping_address).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn list_orders(
    State(s): State<AppState>,
    caller: Caller,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<OrderPage>> {
    let Query(p) = params.map_err(|e| ShopError::InvalidInput(e.body_text()))?;
    Ok(Json(s.orders.list_orders(&caller, p.all, Page::new(p.page, p.limit)).await?))
}

pub async fn get_order(State(s): State<AppState>, caller: Caller, Path(id): Path<String>) -> Result<Json<OrderDetail>> {
    Ok(Json(s.orders.get_order(&caller, &id).await?))
}

pub async fn cancel_order(State(s): State<AppState>, caller: Caller, Path(id): Path<String>) -> Result<Json<CancelResponse>> {
    let order = s.orders.cancel_order(&caller, &id).await?;
    Ok(Json(CancelResponse { message: "Order cancelled successfully.", order }))
}

pub async fn update_order_status(
    State(s): State<AppState>,
    admin: Admin,
    Path(id): Path<String>,
    Payload(r): Payload<StatusRequest>,
) -> Result<Json<Order>> {
    Ok(Json(s.orders.update_status(&admin, &id, &r.status).await?))
}

pub async fn delete_order(State(s): State<AppState>, admin: Admin, Path(id): Path<String>) -> Result<Json<DeletedOrder>> {
    Ok(Json(s.orders.delete_order(&admin, &id).await?))
}

pub async fn payment_failed(State(s): State<AppState>, Payload(r): Payload<PaymentCallback>) -> Result<Json<PaymentCallbackResponse>> {
    let transition = s.orders.mark_failed_payment(&r.order_id).await?;
    Ok(Json(callback_response(transition, "Order status updated to canceled")))
}

pub async fn payment_succeeded(
    State(s): State<AppState>,
    signed: SignedCallback,
    Payload(r): Payload<PaymentConfirmation>,
) -> Result<Json<PaymentCallbackResponse>> {
    let transition = s.orders.mark_paid(&signed, &r.order_id, r.amount).await?;
    Ok(Json(callback_response(transition, "Order marked as paid")))
}

fn callback_response(transition: Transition, applied: &str) -> PaymentCallbackResponse {
    let changed = transition.is_applied();
    let order = transition.into_order();
    let message = if changed {
        applied.to_string()
    } else {
        format!("Order is no longer pending (status {}), nothing changed", order.status)
    };
    PaymentCallbackResponse { message, order_id: order.id, status: order.status, changed }
}
