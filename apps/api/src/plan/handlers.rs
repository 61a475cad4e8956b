//! Axum route handlers for the Plan API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::active_categories;
use crate::errors::AppError;
use crate::models::catalog::CategoryRow;
use crate::models::plan::{OverrideRow, PlanConfigRow};
use crate::models::posting::RoleRow;
use crate::plan::calculator::{compute_role_plan, CategoryPlan, DEFAULT_DIFFICULTY};
use crate::plan::cascade::{get_or_create_plan_config, save_plan_config, PlanConfigUpdate};
use crate::plan::overrides_by_category;
use crate::plan::rubric::{resolve_tier, TierDescriptor};
use crate::postings::require_posting;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PlanConfigResponse {
    pub config: PlanConfigRow,
    pub available_categories: Vec<CategoryRow>,
}

#[derive(Debug, Serialize)]
pub struct SavePlanConfigResponse {
    pub config: PlanConfigRow,
    /// Override rows cleared by the cascade, reported for observability.
    pub invalidated_overrides: u64,
}

#[derive(Debug, Serialize)]
pub struct RolePlanView {
    pub role_id: Uuid,
    pub role_name: String,
    pub pay_multiplier: f64,
    pub position_count: i32,
    pub candidate_count: i64,
    pub tier: &'static TierDescriptor,
    pub categories: Vec<CategoryPlan>,
}

#[derive(Debug, Deserialize)]
pub struct SaveOverrideRequest {
    pub role_id: Uuid,
    pub category_code: String,
    pub question_count: i32,
    pub difficulty_label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkOverrideEntry {
    pub category_code: String,
    pub question_count: i32,
    pub difficulty_label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkRoleOverrides {
    pub role_id: Uuid,
    pub categories: Vec<BulkOverrideEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BulkOverrideRequest {
    pub role_configs: Vec<BulkRoleOverrides>,
}

#[derive(Debug, Serialize)]
pub struct BulkOverrideResponse {
    pub saved: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/postings/:id/plan
///
/// Returns the posting's global plan config, creating it with defaults on
/// first read, together with the active category universe.
pub async fn handle_get_plan_config(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
) -> Result<Json<PlanConfigResponse>, AppError> {
    require_posting(&state.db, posting_id).await?;

    let config = get_or_create_plan_config(&state.db, posting_id).await?;
    let available_categories = active_categories(&state.db).await?;

    Ok(Json(PlanConfigResponse {
        config,
        available_categories,
    }))
}

/// PUT /api/v1/postings/:id/plan
///
/// Replaces the global plan config. Every role override of the posting is
/// invalidated in the same transaction so derived counts recompute from the
/// new settings.
pub async fn handle_save_plan_config(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
    Json(update): Json<PlanConfigUpdate>,
) -> Result<Json<SavePlanConfigResponse>, AppError> {
    require_posting(&state.db, posting_id).await?;

    if update.candidate_multiplier < 0 {
        return Err(AppError::Validation(
            "candidate_multiplier must be non-negative".to_string(),
        ));
    }

    let (config, invalidated_overrides) = save_plan_config(&state.db, posting_id, update).await?;

    Ok(Json(SavePlanConfigResponse {
        config,
        invalidated_overrides,
    }))
}

/// GET /api/v1/postings/:id/role-plans
///
/// Returns the calculator's output for every role of the posting: derived or
/// overridden question counts per active category, plus the resolved tier.
pub async fn handle_get_role_plans(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
) -> Result<Json<Vec<RolePlanView>>, AppError> {
    require_posting(&state.db, posting_id).await?;

    let config = get_or_create_plan_config(&state.db, posting_id).await?;
    let categories = active_categories(&state.db).await?;

    let roles: Vec<RoleRow> =
        sqlx::query_as("SELECT * FROM roles WHERE posting_id = $1 ORDER BY created_at")
            .bind(posting_id)
            .fetch_all(&state.db)
            .await?;

    let mut views = Vec::with_capacity(roles.len());
    for role in roles {
        let overrides = overrides_by_category(&state.db, role.id).await?;
        let plan = compute_role_plan(&role, &config, &overrides, &categories);

        views.push(RolePlanView {
            role_id: role.id,
            role_name: role.name,
            pay_multiplier: role.pay_multiplier,
            position_count: role.position_count,
            candidate_count: plan.candidate_count,
            tier: resolve_tier(role.pay_multiplier),
            categories: plan.categories,
        });
    }

    Ok(Json(views))
}

/// PUT /api/v1/overrides
///
/// Saves a single (role, category) question-count override.
pub async fn handle_save_override(
    State(state): State<AppState>,
    Json(request): Json<SaveOverrideRequest>,
) -> Result<Json<OverrideRow>, AppError> {
    if request.question_count < 0 {
        return Err(AppError::Validation(
            "question_count must be non-negative".to_string(),
        ));
    }

    let row = upsert_override(
        &state.db,
        request.role_id,
        &request.category_code,
        request.question_count,
        request.difficulty_label.as_deref(),
    )
    .await?;

    Ok(Json(row))
}

/// PUT /api/v1/postings/:id/overrides
///
/// Bulk-saves overrides for several roles in one call.
pub async fn handle_save_overrides_bulk(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
    Json(request): Json<BulkOverrideRequest>,
) -> Result<Json<BulkOverrideResponse>, AppError> {
    require_posting(&state.db, posting_id).await?;

    let mut saved = 0;
    for role_config in &request.role_configs {
        for entry in &role_config.categories {
            if entry.question_count < 0 {
                return Err(AppError::Validation(format!(
                    "question_count for category '{}' must be non-negative",
                    entry.category_code
                )));
            }
            upsert_override(
                &state.db,
                role_config.role_id,
                &entry.category_code,
                entry.question_count,
                entry.difficulty_label.as_deref(),
            )
            .await?;
            saved += 1;
        }
    }

    Ok(Json(BulkOverrideResponse { saved }))
}

async fn upsert_override(
    pool: &sqlx::PgPool,
    role_id: Uuid,
    category_code: &str,
    question_count: i32,
    difficulty_label: Option<&str>,
) -> Result<OverrideRow, AppError> {
    let row: OverrideRow = sqlx::query_as(
        r#"
        INSERT INTO category_overrides
            (id, role_id, category_code, question_count, difficulty_label, updated_at)
        VALUES ($1, $2, $3, $4, $5, now())
        ON CONFLICT (role_id, category_code) DO UPDATE SET
            question_count = EXCLUDED.question_count,
            difficulty_label = EXCLUDED.difficulty_label,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(role_id)
    .bind(category_code)
    .bind(question_count)
    .bind(difficulty_label.unwrap_or(DEFAULT_DIFFICULTY))
    .fetch_one(pool)
    .await?;

    Ok(row)
}
