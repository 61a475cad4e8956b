//! Question category catalog — the named, ordered, activatable classification
//! of question purpose. The active subset, in order-index order, is the
//! category universe the planner and the orchestrator iterate over.

pub mod handlers;

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::catalog::CategoryRow;

/// Returns the active categories in display order.
pub async fn active_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, AppError> {
    let rows: Vec<CategoryRow> = sqlx::query_as(
        "SELECT * FROM question_categories WHERE is_active = TRUE ORDER BY order_index",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// The default catalog, inserted at startup when absent.
const DEFAULT_CATEGORIES: [(&str, &str, &str, i32); 3] = [
    (
        "professional_experience",
        "Professional Experience Questions",
        "Questions assessing the candidate's past projects and experience",
        1,
    ),
    (
        "theoretical_knowledge",
        "Theoretical Knowledge Questions",
        "Questions measuring technical concepts and theory",
        2,
    ),
    (
        "practical_application",
        "Practical Application Questions",
        "Questions testing problem solving and applied skills",
        3,
    ),
];

/// Seeds the default question categories. Idempotent: existing codes are left
/// untouched.
pub async fn seed_default_categories(pool: &PgPool) -> Result<()> {
    for (code, name, description, order_index) in DEFAULT_CATEGORIES {
        let inserted = sqlx::query(
            r#"
            INSERT INTO question_categories (id, code, name, description, order_index)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(name)
        .bind(description)
        .bind(order_index)
        .execute(pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!("Seeded default question category '{code}'");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_category_codes_are_unique() {
        let mut codes: Vec<&str> = DEFAULT_CATEGORIES.iter().map(|(c, ..)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_default_categories_have_distinct_order() {
        let mut orders: Vec<i32> = DEFAULT_CATEGORIES.iter().map(|(.., o)| *o).collect();
        orders.sort_unstable();
        orders.dedup();
        assert_eq!(orders.len(), DEFAULT_CATEGORIES.len());
    }
}
