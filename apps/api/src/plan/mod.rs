// Question planning: the seniority rubric, the per-role count calculator, and
// the global-config cascade that invalidates stored overrides.

pub mod calculator;
pub mod cascade;
pub mod handlers;
pub mod rubric;

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::OverrideRow;

/// Loads a role's overrides keyed by category code for the sparse overlay lookup.
pub async fn overrides_by_category(
    pool: &PgPool,
    role_id: Uuid,
) -> Result<HashMap<String, OverrideRow>, AppError> {
    let rows: Vec<OverrideRow> =
        sqlx::query_as("SELECT * FROM category_overrides WHERE role_id = $1")
            .bind(role_id)
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.category_code.clone(), row))
        .collect())
}
