//! Moderation and Q&A handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::orders::StatusRequest;
use super::{AppState, Payload};
use crate::auth::{Admin, Caller};
use crate::domain::aggregates::{Answer, Question, Review, ReviewVideo};
use crate::error::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub question_text: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub answer_text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueueParams {
    pub status: Option<String>,
}

pub async fn list_reviews(State(s): State<AppState>, admin: Admin, Query(p): Query<QueueParams>) -> Result<Json<Vec<Review>>> {
    Ok(Json(s.moderation.list_reviews(&admin, p.status.as_deref()).await?))
}

pub async fn list_review_videos(State(s): State<AppState>, admin: Admin, Query(p): Query<QueueParams>) -> Result<Json<Vec<ReviewVideo>>> {
    Ok(Json(s.moderation.list_review_videos(&admin, p.status.as_deref()).await?))
}

pub async fn set_review_status(
    State(s): State<AppState>,
    admin: Admin,
    Path(id): Path<String>,
    Payload(r): Payload<StatusRequest>,
) -> Result<Json<Review>> {
    Ok(Json(s.moderation.set_review_status(&admin, &id, &r.status).await?))
}

pub async fn set_review_video_status(
    State(s): State<AppState>,
    admin: Admin,
    Path(id): Path<String>,
    Payload(r): Payload<StatusRequest>,
) -> Result<Json<ReviewVideo>> {
    Ok(Json(s.moderation.set_review_video_status(&admin, &id, &r.status).await?))
}

pub async fn create_question(State(s): State<AppState>, caller: Caller, Payload(r): Payload<QuestionRequest>) -> Result<(StatusCode, Json<Question>)> {
    let question = s.qa.create_question(&caller, &r.product_id, &r.question_text).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn create_answer(State(s): State<AppState>, admin: Admin, Payload(r): Payload<AnswerRequest>) -> Result<(StatusCode, Json<Answer>)> {
    let answer = s.qa.create_answer(&admin, &r.question_id, &r.answer_text).await?;
    Ok((StatusCode::CREATED, Json(answer)))
}
