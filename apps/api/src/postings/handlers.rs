//! Axum route handlers for postings and roles.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::posting::{PostingRow, RoleRow};
use crate::postings::require_posting;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePostingRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub general_requirements: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub posting_id: Uuid,
    pub name: String,
    pub pay_multiplier: f64,
    pub position_count: i32,
    #[serde(default)]
    pub special_requirements: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub pay_multiplier: Option<f64>,
    pub position_count: Option<i32>,
    pub special_requirements: Option<String>,
}

/// POST /api/v1/postings
///
/// Creates a posting. Titles are unique; a duplicate is a validation error,
/// not a silent second copy.
pub async fn handle_create_posting(
    State(state): State<AppState>,
    Json(request): Json<CreatePostingRequest>,
) -> Result<Json<PostingRow>, AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }

    let existing: Option<PostingRow> = sqlx::query_as("SELECT * FROM postings WHERE title = $1")
        .bind(title)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "A posting titled '{title}' already exists; choose a different title"
        )));
    }

    let row: PostingRow = sqlx::query_as(
        r#"
        INSERT INTO postings (id, title, body, general_requirements)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(request.body.trim())
    .bind(request.general_requirements.trim())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// GET /api/v1/postings/:id
pub async fn handle_get_posting(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
) -> Result<Json<PostingRow>, AppError> {
    Ok(Json(require_posting(&state.db, posting_id).await?))
}

/// GET /api/v1/postings/:id/roles
pub async fn handle_list_roles(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
) -> Result<Json<Vec<RoleRow>>, AppError> {
    require_posting(&state.db, posting_id).await?;

    let roles: Vec<RoleRow> =
        sqlx::query_as("SELECT * FROM roles WHERE posting_id = $1 ORDER BY created_at")
            .bind(posting_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(roles))
}

/// POST /api/v1/roles
pub async fn handle_create_role(
    State(state): State<AppState>,
    Json(request): Json<CreateRoleRequest>,
) -> Result<Json<RoleRow>, AppError> {
    require_posting(&state.db, request.posting_id).await?;
    validate_role_shape(request.pay_multiplier, request.position_count)?;

    let row: RoleRow = sqlx::query_as(
        r#"
        INSERT INTO roles (id, posting_id, name, pay_multiplier, position_count, special_requirements)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.posting_id)
    .bind(request.name.trim())
    .bind(request.pay_multiplier)
    .bind(request.position_count)
    .bind(request.special_requirements.trim())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// PUT /api/v1/roles/:id
pub async fn handle_update_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<RoleRow>, AppError> {
    let existing: Option<RoleRow> = sqlx::query_as("SELECT * FROM roles WHERE id = $1")
        .bind(role_id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Role {role_id} not found")))?;

    let pay_multiplier = request.pay_multiplier.unwrap_or(existing.pay_multiplier);
    let position_count = request.position_count.unwrap_or(existing.position_count);
    validate_role_shape(pay_multiplier, position_count)?;

    let row: RoleRow = sqlx::query_as(
        r#"
        UPDATE roles
        SET name = $1, pay_multiplier = $2, position_count = $3, special_requirements = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(request.name.unwrap_or(existing.name))
    .bind(pay_multiplier)
    .bind(position_count)
    .bind(
        request
            .special_requirements
            .unwrap_or(existing.special_requirements),
    )
    .bind(role_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// DELETE /api/v1/roles/:id
///
/// Deleting a role cascades to its overrides and questions at the schema level.
pub async fn handle_delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(role_id)
        .execute(&state.db)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound(format!("Role {role_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn validate_role_shape(pay_multiplier: f64, position_count: i32) -> Result<(), AppError> {
    if !(pay_multiplier > 0.0) {
        return Err(AppError::Validation(
            "pay_multiplier must be positive".to_string(),
        ));
    }
    if position_count <= 0 {
        return Err(AppError::Validation(
            "position_count must be positive".to_string(),
        ));
    }
    Ok(())
}
