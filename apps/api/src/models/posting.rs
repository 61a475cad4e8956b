use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A hiring announcement. Titles are unique; the row is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostingRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub general_requirements: String,
    pub created_at: DateTime<Utc>,
}

/// A role within a posting. Deleting a role cascades to its overrides and questions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRow {
    pub id: Uuid,
    pub posting_id: Uuid,
    pub name: String,
    pub pay_multiplier: f64,
    pub position_count: i32,
    pub special_requirements: String,
    pub created_at: DateTime<Utc>,
}
