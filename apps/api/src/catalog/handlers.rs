//! Axum route handlers for the category catalog.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::active_categories;
use crate::errors::AppError;
use crate::models::catalog::CategoryRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order_index: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DeleteCategoryResponse {
    /// "deleted" when the row was removed, "deactivated" when overrides still
    /// reference the category and it was soft-disabled instead.
    pub outcome: String,
}

/// GET /api/v1/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryRow>>, AppError> {
    Ok(Json(active_categories(&state.db).await?))
}

/// POST /api/v1/categories
pub async fn handle_create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<Json<CategoryRow>, AppError> {
    let code = request.code.trim();
    if code.is_empty() {
        return Err(AppError::Validation("code cannot be empty".to_string()));
    }

    let existing: Option<CategoryRow> =
        sqlx::query_as("SELECT * FROM question_categories WHERE code = $1")
            .bind(code)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "Category code '{code}' is already in use"
        )));
    }

    let row: CategoryRow = sqlx::query_as(
        r#"
        INSERT INTO question_categories (id, code, name, description, order_index)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(code)
    .bind(request.name.trim())
    .bind(&request.description)
    .bind(request.order_index)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// PUT /api/v1/categories/:id
pub async fn handle_update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryRow>, AppError> {
    let existing: Option<CategoryRow> =
        sqlx::query_as("SELECT * FROM question_categories WHERE id = $1")
            .bind(category_id)
            .fetch_optional(&state.db)
            .await?;
    let existing =
        existing.ok_or_else(|| AppError::NotFound(format!("Category {category_id} not found")))?;

    let row: CategoryRow = sqlx::query_as(
        r#"
        UPDATE question_categories
        SET name = $1, description = $2, order_index = $3, is_active = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(request.name.unwrap_or(existing.name))
    .bind(request.description.unwrap_or(existing.description))
    .bind(request.order_index.unwrap_or(existing.order_index))
    .bind(request.is_active.unwrap_or(existing.is_active))
    .bind(category_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// DELETE /api/v1/categories/:id
///
/// Hard-deletes an unused category; soft-deactivates one that overrides still
/// reference, so stored plans keep resolving.
pub async fn handle_delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<DeleteCategoryResponse>, AppError> {
    let existing: Option<CategoryRow> =
        sqlx::query_as("SELECT * FROM question_categories WHERE id = $1")
            .bind(category_id)
            .fetch_optional(&state.db)
            .await?;
    let existing =
        existing.ok_or_else(|| AppError::NotFound(format!("Category {category_id} not found")))?;

    let (in_use,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM category_overrides WHERE category_code = $1")
            .bind(&existing.code)
            .fetch_one(&state.db)
            .await?;

    let outcome = if in_use > 0 {
        sqlx::query("UPDATE question_categories SET is_active = FALSE WHERE id = $1")
            .bind(category_id)
            .execute(&state.db)
            .await?;
        "deactivated"
    } else {
        sqlx::query("DELETE FROM question_categories WHERE id = $1")
            .bind(category_id)
            .execute(&state.db)
            .await?;
        "deleted"
    };

    Ok(Json(DeleteCategoryResponse {
        outcome: outcome.to_string(),
    }))
}
