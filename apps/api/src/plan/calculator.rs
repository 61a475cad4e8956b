//! Plan Calculator — derives, per (role, category), how many questions to
//! generate. A pure projection over its inputs: no persistence, no network.
//!
//! Override precedence is a sparse overlay: look the (role, category) pair up
//! in the override map, fall back to the computed default. Overrides are
//! sticky until `plan::cascade` clears them.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::catalog::CategoryRow;
use crate::models::plan::{OverrideRow, PlanConfigRow};
use crate::models::posting::RoleRow;

/// Difficulty label substituted when no override supplies one.
pub const DEFAULT_DIFFICULTY: &str = "medium";

/// Planned question volume for one category of one role.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPlan {
    pub category_code: String,
    pub category_name: String,
    pub question_count: i64,
    pub difficulty_label: String,
    /// True when the count comes from a stored override rather than the
    /// global derivation.
    pub from_override: bool,
}

/// The full plan for one role across the active category universe.
#[derive(Debug, Clone, Serialize)]
pub struct RolePlan {
    pub role_id: Uuid,
    /// position_count × candidate_multiplier, reported for display.
    pub candidate_count: i64,
    pub categories: Vec<CategoryPlan>,
}

/// Reads the per-candidate weight for a category code from the global mapping.
/// Defaults to 1 when the code is absent, the mapping is not an object, or the
/// entry is not a non-negative integer.
pub fn category_weight(weights: &Value, code: &str) -> i64 {
    weights
        .as_object()
        .and_then(|map| map.get(code))
        .and_then(Value::as_i64)
        .filter(|w| *w >= 0)
        .unwrap_or(1)
}

/// Computes the question plan for one role.
///
/// For each active category, in order: an override for (role, category) wins
/// unconditionally; otherwise
/// `count = position_count × candidate_multiplier × weight(category)`.
pub fn compute_role_plan(
    role: &RoleRow,
    config: &PlanConfigRow,
    overrides: &HashMap<String, OverrideRow>,
    categories: &[CategoryRow],
) -> RolePlan {
    let candidate_count = role.position_count as i64 * config.candidate_multiplier as i64;

    let categories = categories
        .iter()
        .map(|category| match overrides.get(&category.code) {
            Some(o) => CategoryPlan {
                category_code: category.code.clone(),
                category_name: category.name.clone(),
                question_count: o.question_count as i64,
                difficulty_label: o.difficulty_label.clone(),
                from_override: true,
            },
            None => CategoryPlan {
                category_code: category.code.clone(),
                category_name: category.name.clone(),
                question_count: candidate_count * category_weight(&config.category_weights, &category.code),
                difficulty_label: DEFAULT_DIFFICULTY.to_string(),
                from_override: false,
            },
        })
        .collect();

    RolePlan {
        role_id: role.id,
        candidate_count,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn role(position_count: i32) -> RoleRow {
        RoleRow {
            id: Uuid::new_v4(),
            posting_id: Uuid::new_v4(),
            name: "Backend Developer".to_string(),
            pay_multiplier: 3.0,
            position_count,
            special_requirements: String::new(),
            created_at: Utc::now(),
        }
    }

    fn config(candidate_multiplier: i32, weights: Value) -> PlanConfigRow {
        PlanConfigRow {
            id: Uuid::new_v4(),
            posting_id: Uuid::new_v4(),
            candidate_multiplier,
            questions_per_candidate: 5,
            category_weights: weights,
            updated_at: Utc::now(),
        }
    }

    fn category(code: &str) -> CategoryRow {
        CategoryRow {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            description: String::new(),
            order_index: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn override_row(role_id: Uuid, code: &str, count: i32) -> OverrideRow {
        OverrideRow {
            id: Uuid::new_v4(),
            role_id,
            category_code: code.to_string(),
            question_count: count,
            difficulty_label: "hard".to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_derived_count_is_positions_times_multiplier_times_weight() {
        // position_count=5, candidate_multiplier=10, weight=2 → 100
        let role = role(5);
        let config = config(10, json!({"theoretical_knowledge": 2}));
        let plan = compute_role_plan(
            &role,
            &config,
            &HashMap::new(),
            &[category("theoretical_knowledge")],
        );

        assert_eq!(plan.candidate_count, 50);
        assert_eq!(plan.categories[0].question_count, 100);
        assert!(!plan.categories[0].from_override);
    }

    #[test]
    fn test_missing_weight_defaults_to_one() {
        let role = role(3);
        let config = config(4, json!({"other_code": 7}));
        let plan = compute_role_plan(&role, &config, &HashMap::new(), &[category("experience")]);

        assert_eq!(plan.categories[0].question_count, 12);
    }

    #[test]
    fn test_malformed_weight_mapping_defaults_to_one() {
        let role = role(2);
        // Mapping is a string, not an object — every category falls back to 1.
        let config = config(5, json!("not-a-map"));
        let plan = compute_role_plan(&role, &config, &HashMap::new(), &[category("experience")]);

        assert_eq!(plan.categories[0].question_count, 10);
    }

    #[test]
    fn test_non_integer_weight_defaults_to_one() {
        let role = role(2);
        let config = config(5, json!({"experience": "lots"}));
        let plan = compute_role_plan(&role, &config, &HashMap::new(), &[category("experience")]);

        assert_eq!(plan.categories[0].question_count, 10);
    }

    #[test]
    fn test_override_wins_regardless_of_global_weight() {
        let role = role(5);
        let config = config(10, json!({"experience": 2}));
        let mut overrides = HashMap::new();
        overrides.insert(
            "experience".to_string(),
            override_row(role.id, "experience", 7),
        );

        let plan = compute_role_plan(&role, &config, &overrides, &[category("experience")]);

        assert_eq!(plan.categories[0].question_count, 7);
        assert_eq!(plan.categories[0].difficulty_label, "hard");
        assert!(plan.categories[0].from_override);
    }

    #[test]
    fn test_override_applies_only_to_its_category() {
        let role = role(1);
        let config = config(10, json!({}));
        let mut overrides = HashMap::new();
        overrides.insert(
            "experience".to_string(),
            override_row(role.id, "experience", 3),
        );

        let plan = compute_role_plan(
            &role,
            &config,
            &overrides,
            &[category("experience"), category("theory")],
        );

        assert_eq!(plan.categories[0].question_count, 3);
        assert_eq!(plan.categories[1].question_count, 10);
        assert_eq!(plan.categories[1].difficulty_label, DEFAULT_DIFFICULTY);
    }

    #[test]
    fn test_category_order_is_preserved() {
        let role = role(1);
        let config = config(1, json!({}));
        let cats = [category("b"), category("a"), category("c")];
        let plan = compute_role_plan(&role, &config, &HashMap::new(), &cats);

        let codes: Vec<&str> = plan
            .categories
            .iter()
            .map(|c| c.category_code.as_str())
            .collect();
        assert_eq!(codes, ["b", "a", "c"]);
    }

    #[test]
    fn test_zero_candidate_multiplier_yields_zero_counts() {
        let role = role(5);
        let config = config(0, json!({"experience": 3}));
        let plan = compute_role_plan(&role, &config, &HashMap::new(), &[category("experience")]);

        assert_eq!(plan.candidate_count, 0);
        assert_eq!(plan.categories[0].question_count, 0);
    }
}
