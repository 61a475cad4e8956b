use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A question category. The active subset, ordered by `order_index`, is the
/// category universe the plan calculator and the orchestrator iterate over.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub order_index: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
