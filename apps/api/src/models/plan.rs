use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Global exam plan settings for one posting. At most one live row per posting;
/// created lazily with defaults on first read.
///
/// `category_weights` maps category code → questions per candidate. Unknown or
/// malformed entries fall back to weight 1 at read time (see `plan::calculator`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanConfigRow {
    pub id: Uuid,
    pub posting_id: Uuid,
    pub candidate_multiplier: i32,
    pub questions_per_candidate: i32,
    pub category_weights: Value,
    pub updated_at: DateTime<Utc>,
}

/// A per-(role, category) question-count override. When present it wins
/// unconditionally over the derived count, until the cascade clears it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OverrideRow {
    pub id: Uuid,
    pub role_id: Uuid,
    pub category_code: String,
    pub question_count: i32,
    pub difficulty_label: String,
    pub updated_at: DateTime<Utc>,
}
