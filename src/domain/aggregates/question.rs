//! Product Q&A

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::ModerationStatus;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub question_text: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn ask(product_id: impl Into<String>, user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            product_id: product_id.into(),
            user_id: user_id.into(),
            question_text: text.into(),
            status: ModerationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub answer_text: String,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn reply(question_id: impl Into<String>, author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            question_id: question_id.into(),
            user_id: author_id.into(),
            answer_text: text.into(),
            created_at: Utc::now(),
        }
    }
}
