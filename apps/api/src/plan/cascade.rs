//! Config cascade — rewriting a posting's global plan settings invalidates
//! every per-role override of that posting.
//!
//! Overrides were tuned under the old global assumptions; keeping them would
//! silently desynchronize role counts from the new intent, so the cascade
//! deletes them all rather than recomputing selectively. Delete and upsert run
//! in one transaction: there is never a window where overrides are gone but
//! the new config is not yet visible.

use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::PlanConfigRow;

/// Defaults applied when a posting's plan config is read before ever being saved.
pub const DEFAULT_CANDIDATE_MULTIPLIER: i32 = 10;
pub const DEFAULT_QUESTIONS_PER_CANDIDATE: i32 = 5;

/// Default category weight mapping for a fresh plan config.
pub fn default_category_weights() -> Value {
    serde_json::json!({
        "professional_experience": 1,
        "theoretical_knowledge": 2,
        "practical_application": 2,
    })
}

/// New global plan values for one posting.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfigUpdate {
    pub candidate_multiplier: i32,
    pub questions_per_candidate: i32,
    pub category_weights: Value,
}

/// Fetches the plan config for a posting, creating it with defaults on first read.
pub async fn get_or_create_plan_config(
    pool: &PgPool,
    posting_id: Uuid,
) -> Result<PlanConfigRow, AppError> {
    let existing: Option<PlanConfigRow> =
        sqlx::query_as("SELECT * FROM plan_configs WHERE posting_id = $1")
            .bind(posting_id)
            .fetch_optional(pool)
            .await?;

    if let Some(config) = existing {
        return Ok(config);
    }

    let config: PlanConfigRow = sqlx::query_as(
        r#"
        INSERT INTO plan_configs
            (id, posting_id, candidate_multiplier, questions_per_candidate, category_weights)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (posting_id) DO UPDATE SET posting_id = EXCLUDED.posting_id
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(posting_id)
    .bind(DEFAULT_CANDIDATE_MULTIPLIER)
    .bind(DEFAULT_QUESTIONS_PER_CANDIDATE)
    .bind(default_category_weights())
    .fetch_one(pool)
    .await?;

    info!("Created default plan config for posting {posting_id}");
    Ok(config)
}

/// Replaces (or creates) a posting's global plan config and deletes every
/// override belonging to any role of that posting, all-or-nothing.
///
/// Returns the saved config and the number of invalidated override rows.
pub async fn save_plan_config(
    pool: &PgPool,
    posting_id: Uuid,
    update: PlanConfigUpdate,
) -> Result<(PlanConfigRow, u64), AppError> {
    let mut tx = pool.begin().await?;

    let config: PlanConfigRow = sqlx::query_as(
        r#"
        INSERT INTO plan_configs
            (id, posting_id, candidate_multiplier, questions_per_candidate, category_weights, updated_at)
        VALUES ($1, $2, $3, $4, $5, now())
        ON CONFLICT (posting_id) DO UPDATE SET
            candidate_multiplier = EXCLUDED.candidate_multiplier,
            questions_per_candidate = EXCLUDED.questions_per_candidate,
            category_weights = EXCLUDED.category_weights,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(posting_id)
    .bind(update.candidate_multiplier)
    .bind(update.questions_per_candidate)
    .bind(&update.category_weights)
    .fetch_one(&mut *tx)
    .await?;

    let invalidated = sqlx::query(
        r#"
        DELETE FROM category_overrides
        WHERE role_id IN (SELECT id FROM roles WHERE posting_id = $1)
        "#,
    )
    .bind(posting_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    info!(
        "Saved plan config for posting {posting_id}; invalidated {invalidated} role override(s)"
    );
    Ok((config, invalidated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_cover_seed_categories() {
        let weights = default_category_weights();
        let map = weights.as_object().unwrap();
        assert_eq!(map["professional_experience"], 1);
        assert_eq!(map["theoretical_knowledge"], 2);
        assert_eq!(map["practical_application"], 2);
    }

    #[test]
    fn test_plan_config_update_deserializes() {
        let json = serde_json::json!({
            "candidate_multiplier": 8,
            "questions_per_candidate": 4,
            "category_weights": {"theoretical_knowledge": 3}
        });
        let update: PlanConfigUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(update.candidate_multiplier, 8);
        assert_eq!(update.questions_per_candidate, 4);
    }
}
