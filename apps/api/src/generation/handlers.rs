//! Axum route handlers for the Generation API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::orchestrator::{generate_for_posting, BatchReport};
use crate::models::posting::RoleRow;
use crate::models::question::QuestionRow;
use crate::postings::require_posting;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Optional model override; falls back to the configured default.
    pub model_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleQuestionsView {
    pub role_id: Uuid,
    pub role_name: String,
    pub total_questions: usize,
    /// Questions grouped by category code.
    pub questions: BTreeMap<String, Vec<QuestionRow>>,
}

#[derive(Debug, Serialize)]
pub struct PostingQuestionsResponse {
    pub posting_id: Uuid,
    pub posting_title: String,
    pub roles: Vec<RoleQuestionsView>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/postings/:id/generate
///
/// Runs one generation batch over every role of the posting. Slot failures
/// degrade, they do not abort; the response reports reachability per role.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<BatchReport>, AppError> {
    let model_name = request
        .model_name
        .unwrap_or_else(|| state.config.default_model.clone());

    let report = generate_for_posting(
        &state.db,
        state.model.as_ref(),
        &model_name,
        posting_id,
    )
    .await?;

    Ok(Json(report))
}

/// GET /api/v1/postings/:id/questions
///
/// Returns all persisted questions of a posting, grouped by role and category.
pub async fn handle_get_questions(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
) -> Result<Json<PostingQuestionsResponse>, AppError> {
    let posting = require_posting(&state.db, posting_id).await?;

    let roles: Vec<RoleRow> =
        sqlx::query_as("SELECT * FROM roles WHERE posting_id = $1 ORDER BY created_at")
            .bind(posting_id)
            .fetch_all(&state.db)
            .await?;

    let mut views = Vec::with_capacity(roles.len());
    for role in roles {
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

        let total_questions = rows.len();
        let mut grouped: BTreeMap<String, Vec<QuestionRow>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.category_code.clone()).or_default().push(row);
        }

        views.push(RoleQuestionsView {
            role_id: role.id,
            role_name: role.name,
            total_questions,
            questions: grouped,
        });
    }

    Ok(Json(PostingQuestionsResponse {
        posting_id,
        posting_title: posting.title,
        roles: views,
    }))
}
