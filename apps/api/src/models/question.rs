#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A generated interview question. Append-only: regeneration inserts new rows,
/// never updates existing ones.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub role_id: Uuid,
    pub posting_id: Uuid,
    pub category_code: String,
    pub question_text: String,
    pub difficulty_label: String,
    pub expected_answer: String,
    pub scoring_notes: String,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
}

/// One row per generation attempt. Append-only audit trail; never read by the
/// engine itself.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GenerationLogRow {
    pub id: Uuid,
    pub posting_id: Uuid,
    pub role_id: Uuid,
    pub model_name: String,
    pub prompt_chars: i32,
    pub response_chars: i32,
    pub elapsed_ms: i64,
    pub status: String,
    pub error_message: Option<String>,
    pub raw_prompt: String,
    pub raw_response: String,
    pub created_at: DateTime<Utc>,
}
