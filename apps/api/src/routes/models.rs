use axum::extract::State;
use axum::Json;

use crate::llm_client::{model_catalog, ModelInfo};
use crate::state::AppState;

/// GET /api/v1/models
/// Lists the generation models clients may select from.
pub async fn handle_list_models(State(state): State<AppState>) -> Json<Vec<ModelInfo>> {
    Json(model_catalog(&state.config.default_model))
}
