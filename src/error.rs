//! Unified error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::aggregates::{OrderError, ProductError};
use crate::domain::value_objects::StatusError;
use crate::store::StoreError;

/// Application-level error. Every variant maps to one HTTP status and one
/// machine-readable code.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Missing identity or insufficient role. There is no separate
    /// unauthenticated class.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed body or a value outside its allowed set.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    code: &'static str,
}

impl ShopError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Store(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{entity} not found")) }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store details stay in the log
        let message = match &self {
            Self::Store(_) => {
                tracing::error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(ErrorBody { message, code: self.code() })).into_response()
    }
}

impl From<StatusError> for ShopError {
    fn from(e: StatusError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<OrderError> for ShopError {
    fn from(e: OrderError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<ProductError> for ShopError {
    fn from(e: ProductError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(e: validator::ValidationErrors) -> Self { Self::InvalidInput(format!("Invalid request body: {e}")) }
}

pub type Result<T> = std::result::Result<T, ShopError>;
