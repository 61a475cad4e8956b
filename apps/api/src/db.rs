use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Idempotent schema bootstrap, executed once at startup.
///
/// Cascades mirror the ownership model: a posting exclusively owns its roles,
/// a role exclusively owns its overrides and questions.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    // Raw multi-statement execution; sqlx runs this over the simple protocol.
    pool.execute(SCHEMA_DDL).await?;
    info!("Database schema verified");
    Ok(())
}

const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS postings (
    id UUID PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    body TEXT NOT NULL DEFAULT '',
    general_requirements TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS roles (
    id UUID PRIMARY KEY,
    posting_id UUID NOT NULL REFERENCES postings(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    pay_multiplier DOUBLE PRECISION NOT NULL,
    position_count INTEGER NOT NULL,
    special_requirements TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS question_categories (
    id UUID PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    order_index INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS plan_configs (
    id UUID PRIMARY KEY,
    posting_id UUID NOT NULL UNIQUE REFERENCES postings(id) ON DELETE CASCADE,
    candidate_multiplier INTEGER NOT NULL DEFAULT 10,
    questions_per_candidate INTEGER NOT NULL DEFAULT 5,
    category_weights JSONB NOT NULL DEFAULT '{}'::jsonb,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS category_overrides (
    id UUID PRIMARY KEY,
    role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    category_code TEXT NOT NULL,
    question_count INTEGER NOT NULL,
    difficulty_label TEXT NOT NULL DEFAULT 'medium',
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (role_id, category_code)
);

CREATE TABLE IF NOT EXISTS questions (
    id UUID PRIMARY KEY,
    role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    posting_id UUID NOT NULL REFERENCES postings(id) ON DELETE CASCADE,
    category_code TEXT NOT NULL,
    question_text TEXT NOT NULL,
    difficulty_label TEXT NOT NULL DEFAULT 'medium',
    expected_answer TEXT NOT NULL DEFAULT '',
    scoring_notes TEXT NOT NULL DEFAULT '',
    model_name TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_questions_role_category
    ON questions (role_id, category_code);

CREATE TABLE IF NOT EXISTS generation_logs (
    id UUID PRIMARY KEY,
    posting_id UUID NOT NULL,
    role_id UUID NOT NULL,
    model_name TEXT NOT NULL,
    prompt_chars INTEGER NOT NULL,
    response_chars INTEGER NOT NULL,
    elapsed_ms BIGINT NOT NULL,
    status TEXT NOT NULL,
    error_message TEXT,
    raw_prompt TEXT NOT NULL,
    raw_response TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;
