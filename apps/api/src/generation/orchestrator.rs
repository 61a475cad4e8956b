//! Generation Orchestrator — drives one batch over roles × active categories ×
//! slots, one model call per slot.
//!
//! Flow: load plan inputs → compute per-role counts → generate sequentially →
//! persist all questions and audit logs in one transaction → report per role.
//!
//! Slots are issued one at a time on purpose: no cross-slot state is needed
//! for correctness, and sequential issuance is the load-shedding strategy
//! against the model provider's rate limits. A failed slot records a degraded
//! placeholder and the batch continues; only a failed final commit fails the
//! batch, and then nothing is visible. A caller that drops the future before
//! commit abandons the batch with no partial rows.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::active_categories;
use crate::errors::AppError;
use crate::generation::builder::{build_slot_prompt, JobContext};
use crate::generation::repair::repair_response;
use crate::llm_client::ChatModel;
use crate::models::posting::{PostingRow, RoleRow};
use crate::plan::calculator::{compute_role_plan, RolePlan};
use crate::plan::cascade::get_or_create_plan_config;
use crate::plan::overrides_by_category;
use crate::plan::rubric::{resolve_tier, TierDescriptor};
use crate::postings::require_posting;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Batch lifecycle. A batch that finishes with any degraded slot ends
/// `PartiallyCompleted`; persistence failure surfaces as an error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    InProgress,
    Completed,
    PartiallyCompleted,
}

/// One generated (or degraded placeholder) question, not yet persisted.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedQuestion {
    pub role_id: Uuid,
    pub category_code: String,
    pub question_text: String,
    pub expected_answer: String,
    pub difficulty_label: String,
    /// True when the model call failed and a placeholder was recorded.
    pub degraded: bool,
}

/// Audit record for one slot attempt, persisted to `generation_logs`.
#[derive(Debug, Clone)]
pub struct SlotLog {
    pub role_id: Uuid,
    pub prompt_chars: i32,
    pub response_chars: i32,
    pub elapsed_ms: i64,
    pub status: &'static str,
    pub error_message: Option<String>,
    pub raw_prompt: String,
    pub raw_response: String,
}

/// Per-role slice of the batch report: questions grouped by category.
#[derive(Debug, Clone, Serialize)]
pub struct RoleReport {
    pub role_id: Uuid,
    pub role_name: String,
    pub pay_multiplier: f64,
    pub tier: &'static TierDescriptor,
    pub model_reachable: bool,
    pub error: Option<String>,
    pub questions: BTreeMap<String, Vec<GeneratedQuestion>>,
    pub total_questions: usize,
}

/// The full batch report returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub model_name: String,
    pub total_questions: usize,
    pub roles: Vec<RoleReport>,
}

/// In-memory result of the generation loop, before persistence.
pub struct GenerationPass {
    pub status: BatchStatus,
    pub questions: Vec<GeneratedQuestion>,
    pub logs: Vec<SlotLog>,
    pub reports: Vec<RoleReport>,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation loop (no persistence — testable with a scripted model)
// ────────────────────────────────────────────────────────────────────────────

/// Runs the generation loop for every (role, plan) pair.
///
/// Failure of one slot never aborts the batch: the slot records a degraded
/// placeholder, the role is flagged unreachable, and iteration continues.
pub async fn run_generation_pass(
    model: &dyn ChatModel,
    model_name: &str,
    posting: &PostingRow,
    prepared: &[(RoleRow, RolePlan)],
) -> GenerationPass {
    let mut pass = GenerationPass {
        status: BatchStatus::Pending,
        questions: Vec::new(),
        logs: Vec::new(),
        reports: Vec::new(),
    };
    pass.status = BatchStatus::InProgress;
    let mut any_degraded = false;

    for (role, plan) in prepared {
        let tier = resolve_tier(role.pay_multiplier);
        let context = JobContext {
            posting_title: &posting.title,
            general_requirements: &posting.general_requirements,
            role_name: &role.name,
            position_count: role.position_count,
            special_requirements: &role.special_requirements,
        };

        let mut grouped: BTreeMap<String, Vec<GeneratedQuestion>> = BTreeMap::new();
        let mut reachable = true;
        let mut last_error: Option<String> = None;

        for category in &plan.categories {
            for slot in 1..=category.question_count {
                let prompt = build_slot_prompt(
                    &context,
                    tier,
                    &category.category_name,
                    slot,
                    category.question_count,
                );
                let started = Instant::now();

                let question = match model.complete(model_name, prompt.system, &prompt.user).await
                {
                    Ok(raw) => {
                        let pair = repair_response(&raw);
                        if !pair.parsed {
                            warn!(
                                "Slot {slot}/{} for role '{}' category '{}' did not parse; \
                                 using raw text fallback",
                                category.question_count, role.name, category.category_code
                            );
                        }
                        pass.logs.push(SlotLog {
                            role_id: role.id,
                            prompt_chars: prompt.user.len() as i32,
                            response_chars: raw.len() as i32,
                            elapsed_ms: started.elapsed().as_millis() as i64,
                            status: if pair.parsed { "success" } else { "partial" },
                            error_message: (!pair.parsed)
                                .then(|| "response did not parse as JSON; recovered".to_string()),
                            raw_prompt: prompt.user.clone(),
                            raw_response: raw,
                        });
                        GeneratedQuestion {
                            role_id: role.id,
                            category_code: category.category_code.clone(),
                            question_text: pair.question,
                            expected_answer: pair.expected_answer,
                            difficulty_label: tier.label.to_string(),
                            degraded: false,
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Model call failed for role '{}' category '{}' slot {slot}: {e}",
                            role.name, category.category_code
                        );
                        reachable = false;
                        any_degraded = true;
                        last_error = Some(e.to_string());
                        pass.logs.push(SlotLog {
                            role_id: role.id,
                            prompt_chars: prompt.user.len() as i32,
                            response_chars: 0,
                            elapsed_ms: started.elapsed().as_millis() as i64,
                            status: "failed",
                            error_message: Some(e.to_string()),
                            raw_prompt: prompt.user.clone(),
                            raw_response: String::new(),
                        });
                        GeneratedQuestion {
                            role_id: role.id,
                            category_code: category.category_code.clone(),
                            question_text: format!(
                                "{} question {slot} could not be generated (model unavailable)",
                                category.category_name
                            ),
                            expected_answer: String::new(),
                            difficulty_label: tier.label.to_string(),
                            degraded: true,
                        }
                    }
                };

                grouped
                    .entry(category.category_code.clone())
                    .or_default()
                    .push(question.clone());
                pass.questions.push(question);
            }
        }

        let total = grouped.values().map(Vec::len).sum();
        pass.reports.push(RoleReport {
            role_id: role.id,
            role_name: role.name.clone(),
            pay_multiplier: role.pay_multiplier,
            tier,
            model_reachable: reachable,
            error: last_error,
            questions: grouped,
            total_questions: total,
        });
    }

    pass.status = if any_degraded {
        BatchStatus::PartiallyCompleted
    } else {
        BatchStatus::Completed
    };
    pass
}

// ────────────────────────────────────────────────────────────────────────────
// Batch entry point (load → generate → persist)
// ────────────────────────────────────────────────────────────────────────────

/// Generates questions for every role of a posting and persists the whole
/// batch in one transaction. Nothing is visible until commit; a persistence
/// failure rolls the batch back entirely.
pub async fn generate_for_posting(
    pool: &PgPool,
    model: &dyn ChatModel,
    model_name: &str,
    posting_id: Uuid,
) -> Result<BatchReport, AppError> {
    let posting = require_posting(pool, posting_id).await?;
    let config = get_or_create_plan_config(pool, posting_id).await?;
    let categories = active_categories(pool).await?;

    let roles: Vec<RoleRow> =
        sqlx::query_as("SELECT * FROM roles WHERE posting_id = $1 ORDER BY created_at")
            .bind(posting_id)
            .fetch_all(pool)
            .await?;

    if roles.is_empty() {
        return Err(AppError::Validation(
            "Posting has no roles; add roles before generating questions".to_string(),
        ));
    }

    let mut prepared: Vec<(RoleRow, RolePlan)> = Vec::with_capacity(roles.len());
    for role in roles {
        let overrides: HashMap<_, _> = overrides_by_category(pool, role.id).await?;
        let plan = compute_role_plan(&role, &config, &overrides, &categories);
        prepared.push((role, plan));
    }

    let slot_total: i64 = prepared
        .iter()
        .flat_map(|(_, plan)| plan.categories.iter())
        .map(|c| c.question_count)
        .sum();
    info!(
        "Starting generation batch for posting '{}': {} role(s), {} slot(s), model {}",
        posting.title,
        prepared.len(),
        slot_total,
        model_name
    );

    let pass = run_generation_pass(model, model_name, &posting, &prepared).await;

    let mut tx = pool.begin().await?;
    for question in &pass.questions {
        sqlx::query(
            r#"
            INSERT INTO questions
                (id, role_id, posting_id, category_code, question_text,
                 difficulty_label, expected_answer, scoring_notes, model_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, '', $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question.role_id)
        .bind(posting_id)
        .bind(&question.category_code)
        .bind(&question.question_text)
        .bind(&question.difficulty_label)
        .bind(&question.expected_answer)
        .bind(model_name)
        .execute(&mut *tx)
        .await?;
    }
    for log in &pass.logs {
        sqlx::query(
            r#"
            INSERT INTO generation_logs
                (id, posting_id, role_id, model_name, prompt_chars, response_chars,
                 elapsed_ms, status, error_message, raw_prompt, raw_response)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(posting_id)
        .bind(log.role_id)
        .bind(model_name)
        .bind(log.prompt_chars)
        .bind(log.response_chars)
        .bind(log.elapsed_ms)
        .bind(log.status)
        .bind(&log.error_message)
        .bind(&log.raw_prompt)
        .bind(&log.raw_response)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(
        "Generation batch for posting '{}' finished: {:?}, {} question(s) persisted",
        posting.title,
        pass.status,
        pass.questions.len()
    );

    Ok(BatchReport {
        status: pass.status,
        model_name: model_name.to_string(),
        total_questions: pass.questions.len(),
        roles: pass.reports,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::plan::calculator::CategoryPlan;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted model collaborator: pops one canned outcome per call.
    /// `None` scripts a transport failure.
    struct ScriptedModel {
        responses: Mutex<VecDeque<Option<String>>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Option<&str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_owned))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            _model: &str,
            _system: &str,
            _user: &str,
        ) -> Result<String, LlmError> {
            match self.responses.lock().unwrap().pop_front() {
                Some(Some(text)) => Ok(text),
                Some(None) => Err(LlmError::Api {
                    status: 503,
                    message: "service unavailable".to_string(),
                }),
                None => panic!("scripted model ran out of responses"),
            }
        }
    }

    fn posting() -> PostingRow {
        PostingRow {
            id: Uuid::new_v4(),
            title: "Test Posting".to_string(),
            body: String::new(),
            general_requirements: "General requirements".to_string(),
            created_at: Utc::now(),
        }
    }

    fn role(pay_multiplier: f64) -> RoleRow {
        RoleRow {
            id: Uuid::new_v4(),
            posting_id: Uuid::new_v4(),
            name: "Developer".to_string(),
            pay_multiplier,
            position_count: 1,
            special_requirements: "Rust, Postgres".to_string(),
            created_at: Utc::now(),
        }
    }

    fn plan(role_id: Uuid, counts: &[(&str, i64)]) -> RolePlan {
        RolePlan {
            role_id,
            candidate_count: 10,
            categories: counts
                .iter()
                .map(|(code, count)| CategoryPlan {
                    category_code: code.to_string(),
                    category_name: format!("{code} questions"),
                    question_count: *count,
                    difficulty_label: "medium".to_string(),
                    from_override: false,
                })
                .collect(),
        }
    }

    const GOOD: &str = r#"{"question":"Explain BGP route selection.","expected_answer":"The candidate is expected to explain the decision process.\n\nKeywords: BGP, routing, policy, metric"}"#;

    #[tokio::test]
    async fn test_all_slots_succeed_yields_completed() {
        let model = ScriptedModel::new(vec![Some(GOOD); 3]);
        let posting = posting();
        let role = role(3.0);
        let prepared = vec![(role.clone(), plan(role.id, &[("theory", 2), ("applied", 1)]))];

        let pass = run_generation_pass(&model, "gpt-4o-mini", &posting, &prepared).await;

        assert_eq!(pass.status, BatchStatus::Completed);
        assert_eq!(pass.questions.len(), 3);
        assert!(pass.questions.iter().all(|q| !q.degraded));
        assert_eq!(pass.logs.len(), 3);
        assert!(pass.logs.iter().all(|l| l.status == "success"));

        let report = &pass.reports[0];
        assert!(report.model_reachable);
        assert!(report.error.is_none());
        assert_eq!(report.total_questions, 3);
        assert_eq!(report.questions["theory"].len(), 2);
        assert_eq!(report.questions["applied"].len(), 1);
        assert_eq!(report.tier.label, "3x");
        // Generated questions carry the tier label as difficulty.
        assert!(pass.questions.iter().all(|q| q.difficulty_label == "3x"));
    }

    #[tokio::test]
    async fn test_one_failed_slot_does_not_abort_the_batch() {
        let model = ScriptedModel::new(vec![Some(GOOD), None, Some(GOOD)]);
        let posting = posting();
        let role = role(2.0);
        let prepared = vec![(role.clone(), plan(role.id, &[("theory", 3)]))];

        let pass = run_generation_pass(&model, "gpt-4o-mini", &posting, &prepared).await;

        assert_eq!(pass.status, BatchStatus::PartiallyCompleted);
        // All three slots produce rows; one is a degraded placeholder.
        assert_eq!(pass.questions.len(), 3);
        assert_eq!(pass.questions.iter().filter(|q| q.degraded).count(), 1);
        assert_eq!(pass.logs.iter().filter(|l| l.status == "failed").count(), 1);

        let report = &pass.reports[0];
        assert!(!report.model_reachable);
        assert!(report.error.as_deref().unwrap().contains("503"));
        // The degraded placeholder names the category and the slot.
        let degraded = pass.questions.iter().find(|q| q.degraded).unwrap();
        assert!(degraded.question_text.contains("could not be generated"));
        assert!(degraded.expected_answer.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_is_recovered_not_fatal() {
        let model = ScriptedModel::new(vec![Some("utterly not json")]);
        let posting = posting();
        let role = role(2.0);
        let prepared = vec![(role.clone(), plan(role.id, &[("theory", 1)]))];

        let pass = run_generation_pass(&model, "gpt-4o-mini", &posting, &prepared).await;

        assert_eq!(pass.status, BatchStatus::Completed);
        assert_eq!(pass.questions.len(), 1);
        assert!(!pass.questions[0].degraded);
        assert_eq!(pass.questions[0].question_text, "utterly not json");
        assert_eq!(pass.logs[0].status, "partial");
        assert!(pass.logs[0].error_message.as_deref().unwrap().contains("recovered"));
    }

    #[tokio::test]
    async fn test_zero_count_category_requests_no_slots() {
        let model = ScriptedModel::new(vec![]);
        let posting = posting();
        let role = role(2.0);
        let prepared = vec![(role.clone(), plan(role.id, &[("theory", 0)]))];

        let pass = run_generation_pass(&model, "gpt-4o-mini", &posting, &prepared).await;

        assert_eq!(pass.status, BatchStatus::Completed);
        assert!(pass.questions.is_empty());
        assert!(pass.logs.is_empty());
        assert_eq!(pass.reports[0].total_questions, 0);
    }

    #[tokio::test]
    async fn test_roles_are_processed_independently() {
        // Role A's failure must not mark role B unreachable.
        let model = ScriptedModel::new(vec![None, Some(GOOD)]);
        let posting = posting();
        let role_a = role(2.0);
        let role_b = role(4.5);
        let prepared = vec![
            (role_a.clone(), plan(role_a.id, &[("theory", 1)])),
            (role_b.clone(), plan(role_b.id, &[("theory", 1)])),
        ];

        let pass = run_generation_pass(&model, "gpt-4o-mini", &posting, &prepared).await;

        assert_eq!(pass.status, BatchStatus::PartiallyCompleted);
        assert!(!pass.reports[0].model_reachable);
        assert!(pass.reports[1].model_reachable);
        assert_eq!(pass.reports[1].tier.label, "5x");
    }

    #[test]
    fn test_batch_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&BatchStatus::PartiallyCompleted).unwrap(),
            "\"partially_completed\""
        );
        assert_eq!(
            serde_json::to_string(&BatchStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&BatchStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
