//! HTTP surface.

pub mod admin;
pub mod catalog;
pub mod content;
pub mod orders;

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequest, Request},
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;

use crate::auth::{self, CallbackSecret, JwtService};
use crate::domain::events::EventPublisher;
use crate::error::ShopError;
use crate::services::{Catalog, Maintenance, Moderation, OrderLifecycle, QaDesk};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderLifecycle,
    pub moderation: Moderation,
    pub qa: QaDesk,
    pub catalog: Catalog,
    pub maintenance: Maintenance,
    pub jwt: Arc<JwtService>,
    pub callback_secret: CallbackSecret,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher, jwt: Arc<JwtService>, callback_secret: CallbackSecret) -> Self {
        Self {
            orders: OrderLifecycle::new(store.clone(), events.clone()),
            moderation: Moderation::new(store.clone(), events.clone()),
            qa: QaDesk::new(store.clone(), events.clone()),
            catalog: Catalog::new(store.clone()),
            maintenance: Maintenance::new(store, events),
            jwt,
            callback_secret,
        }
    }
}

impl FromRef<AppState> for Arc<JwtService> {
    fn from_ref(state: &AppState) -> Self { state.jwt.clone() }
}

impl FromRef<AppState> for CallbackSecret {
    fn from_ref(state: &AppState) -> Self { state.callback_secret.clone() }
}

/// JSON body that has been deserialized and validated. Any failure is
/// reported as `InvalidInput`.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ShopError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ShopError::InvalidInput(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "miga-shop"})) }))
        .route("/api/v1/products", post(catalog::create_product))
        .route("/api/v1/products/:id", get(catalog::get_product))
        .route("/api/v1/checkout", post(orders::checkout))
        .route("/api/v1/orders", get(orders::list_orders))
        .route("/api/v1/orders/:id", get(orders::get_order))
        .route("/api/v1/orders/:id/cancel", post(orders::cancel_order))
        .route("/api/v1/payment/success", post(orders::payment_succeeded))
        .route("/api/v1/payment/fail", post(orders::payment_failed))
        .route("/api/v1/admin/orders/:id", delete(orders::delete_order))
        .route("/api/v1/admin/orders/:id/status", put(orders::update_order_status))
        .route("/api/v1/admin/reviews", get(content::list_reviews))
        .route("/api/v1/admin/reviews/videos", get(content::list_review_videos))
        .route("/api/v1/admin/reviews/:id/status", put(content::set_review_status))
        .route("/api/v1/admin/reviews/videos/:id/status", patch(content::set_review_video_status))
        .route("/api/v1/questions", post(content::create_question))
        .route("/api/v1/answers", post(content::create_answer))
        .route("/api/v1/admin/users/:id/orders", delete(admin::purge_user_orders))
        .route("/api/v1/admin/sourced-products", delete(admin::purge_sourced_products))
        .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
