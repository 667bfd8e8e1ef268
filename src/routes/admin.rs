//! Maintenance endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::auth::Admin;
use crate::domain::aggregates::PurgeCounts;
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
pub struct SourcedPurgeParams {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SourcedPurgeResponse {
    pub deleted: u64,
}

pub async fn purge_user_orders(State(s): State<AppState>, admin: Admin, Path(user_id): Path<String>) -> Result<Json<PurgeCounts>> {
    Ok(Json(s.maintenance.purge_user_orders(&admin, &user_id).await?))
}

pub async fn purge_sourced_products(
    State(s): State<AppState>,
    admin: Admin,
    Query(p): Query<SourcedPurgeParams>,
) -> Result<Json<SourcedPurgeResponse>> {
    let deleted = s.maintenance.purge_sourced_products(&admin, p.status.as_deref()).await?;
    Ok(Json(SourcedPurgeResponse { deleted }))
}
