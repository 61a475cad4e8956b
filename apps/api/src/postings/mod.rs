//! Postings and their roles — CRUD surface around the entities the generation
//! engine reads.

pub mod handlers;

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::posting::PostingRow;

/// Fetches a posting or fails with `NotFound`.
pub async fn require_posting(pool: &PgPool, posting_id: Uuid) -> Result<PostingRow, AppError> {
    let posting: Option<PostingRow> = sqlx::query_as("SELECT * FROM postings WHERE id = $1")
        .bind(posting_id)
        .fetch_optional(pool)
        .await?;
    posting.ok_or_else(|| AppError::NotFound(format!("Posting {posting_id} not found")))
}
