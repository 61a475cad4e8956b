pub mod health;
pub mod models;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::catalog::handlers as catalog_handlers;
use crate::export::handlers as export_handlers;
use crate::generation::handlers as generation_handlers;
use crate::plan::handlers as plan_handlers;
use crate::postings::handlers as posting_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Postings and roles
        .route(
            "/api/v1/postings",
            post(posting_handlers::handle_create_posting),
        )
        .route(
            "/api/v1/postings/:id",
            get(posting_handlers::handle_get_posting),
        )
        .route(
            "/api/v1/postings/:id/roles",
            get(posting_handlers::handle_list_roles),
        )
        .route("/api/v1/roles", post(posting_handlers::handle_create_role))
        .route(
            "/api/v1/roles/:id",
            put(posting_handlers::handle_update_role)
                .delete(posting_handlers::handle_delete_role),
        )
        // Category catalog
        .route(
            "/api/v1/categories",
            get(catalog_handlers::handle_list_categories)
                .post(catalog_handlers::handle_create_category),
        )
        .route(
            "/api/v1/categories/:id",
            put(catalog_handlers::handle_update_category)
                .delete(catalog_handlers::handle_delete_category),
        )
        // Question planning
        .route(
            "/api/v1/postings/:id/plan",
            get(plan_handlers::handle_get_plan_config)
                .put(plan_handlers::handle_save_plan_config),
        )
        .route(
            "/api/v1/postings/:id/role-plans",
            get(plan_handlers::handle_get_role_plans),
        )
        .route(
            "/api/v1/overrides",
            put(plan_handlers::handle_save_override),
        )
        .route(
            "/api/v1/postings/:id/overrides",
            put(plan_handlers::handle_save_overrides_bulk),
        )
        // Generation
        .route(
            "/api/v1/postings/:id/generate",
            post(generation_handlers::handle_generate),
        )
        .route(
            "/api/v1/postings/:id/questions",
            get(generation_handlers::handle_get_questions),
        )
        // Export
        .route(
            "/api/v1/postings/:id/export",
            get(export_handlers::handle_export),
        )
        // Model catalog
        .route("/api/v1/models", get(models::handle_list_models))
        .with_state(state)
}
