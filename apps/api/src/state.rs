use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::ChatModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// The model collaborator. A trait object so batches are independently
    /// testable with scripted fakes instead of a process-wide client.
    pub model: Arc<dyn ChatModel>,
    pub config: Config,
}
