//! Axum route handlers for the Export API.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{
    max_candidate_slot, render_candidate_sheet, sheet_filename, SheetVariant, DOCX_MIME,
};
use crate::models::catalog::CategoryRow;
use crate::models::posting::RoleRow;
use crate::models::question::QuestionRow;
use crate::postings::require_posting;
use crate::state::AppState;

fn default_candidate() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub role_id: Uuid,
    #[serde(default = "default_candidate")]
    pub candidate: i64,
    /// "questions" (default) or "answers".
    #[serde(default)]
    pub variant: String,
}

/// GET /api/v1/postings/:id/export?role_id=&candidate=&variant=
///
/// Streams one candidate sheet as a Word document. Question rows stay
/// queryable by (role, category); this handler only groups and renders them.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let posting = require_posting(&state.db, posting_id).await?;
    let variant = SheetVariant::parse(&query.variant)?;

    if query.candidate < 1 {
        return Err(AppError::Validation(
            "candidate must be at least 1".to_string(),
        ));
    }

    let role: Option<RoleRow> =
        sqlx::query_as("SELECT * FROM roles WHERE id = $1 AND posting_id = $2")
            .bind(query.role_id)
            .bind(posting_id)
            .fetch_optional(&state.db)
            .await?;
    let role = role.ok_or_else(|| {
        AppError::NotFound(format!("Role {} not found in posting", query.role_id))
    })?;

    let rows: Vec<QuestionRow> = sqlx::query_as(
        r#"
        SELECT * FROM questions
        WHERE role_id = $1 AND posting_id = $2
        ORDER BY category_code, created_at
        "#,
    )
    .bind(role.id)
    .bind(posting_id)
    .fetch_all(&state.db)
    .await?;

    if rows.is_empty() {
        return Err(AppError::NotFound(
            "No questions have been generated for this role yet".to_string(),
        ));
    }

    let mut by_category: BTreeMap<String, Vec<QuestionRow>> = BTreeMap::new();
    for row in rows {
        by_category
            .entry(row.category_code.clone())
            .or_default()
            .push(row);
    }

    let max_slot = max_candidate_slot(&by_category);
    if query.candidate as usize > max_slot {
        return Err(AppError::NotFound(format!(
            "Candidate {} exceeds the available slots ({max_slot}) for this role",
            query.candidate
        )));
    }

    let categories: Vec<CategoryRow> = sqlx::query_as("SELECT * FROM question_categories")
        .fetch_all(&state.db)
        .await?;
    let category_names: BTreeMap<String, String> = categories
        .into_iter()
        .map(|c| (c.code, c.name))
        .collect();

    let bytes = render_candidate_sheet(
        &posting,
        &role,
        &category_names,
        &by_category,
        query.candidate,
        variant,
    )?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        sheet_filename(&role, query.candidate, variant)
    );

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
