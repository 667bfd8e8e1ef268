use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{AppState, Payload};
use crate::auth::Admin;
use crate::domain::aggregates::Product;
use crate::error::Result;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0))]
    pub price: i64,
}

pub async fn create_product(State(s): State<AppState>, admin: Admin, Payload(r): Payload<CreateProductRequest>) -> Result<(StatusCode, Json<Product>)> {
    let product = s.catalog.create_product(&admin, &r.name, r.price).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    Ok(Json(s.catalog.get_product(&id).await?))
}
