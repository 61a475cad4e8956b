//! Prompt builder — assembles the per-slot generation request from the job
//! context, the resolved tier and the target category. Pure: no network, no
//! persistence.

use crate::generation::prompts::{GENERATION_SYSTEM, SLOT_PROMPT_TEMPLATE};
use crate::llm_client::prompts::{
    DIVERSITY_INSTRUCTION, JSON_ONLY_INSTRUCTION, NO_CODE_INSTRUCTION,
};
use crate::plan::rubric::TierDescriptor;

/// Free-text job context shared by every slot of one role.
#[derive(Debug, Clone)]
pub struct JobContext<'a> {
    pub posting_title: &'a str,
    pub general_requirements: &'a str,
    pub role_name: &'a str,
    pub position_count: i32,
    pub special_requirements: &'a str,
}

/// One generation request: a fixed system instruction plus the slot-specific
/// user instruction.
#[derive(Debug, Clone)]
pub struct SlotPrompt {
    pub system: &'static str,
    pub user: String,
}

/// Builds the generation request for slot `slot_index` (1-based) of
/// `slot_total` in the given category.
pub fn build_slot_prompt(
    context: &JobContext<'_>,
    tier: &TierDescriptor,
    category_name: &str,
    slot_index: i64,
    slot_total: i64,
) -> SlotPrompt {
    let user = SLOT_PROMPT_TEMPLATE
        .replace("{posting_title}", context.posting_title)
        .replace(
            "{general_requirements}",
            or_unspecified(context.general_requirements),
        )
        .replace("{role_name}", context.role_name)
        .replace("{position_count}", &context.position_count.to_string())
        .replace(
            "{special_requirements}",
            or_unspecified(context.special_requirements),
        )
        .replace("{category_name}", category_name)
        .replace("{slot_index}", &slot_index.to_string())
        .replace("{slot_total}", &slot_total.to_string())
        .replace("{tier_label}", tier.label)
        .replace("{tier_name}", tier.name)
        .replace("{experience_years}", tier.experience_years)
        .replace("{k1}", &tier.weights.recall.to_string())
        .replace("{k2}", &tier.weights.applied.to_string())
        .replace("{k3}", &tier.weights.troubleshooting.to_string())
        .replace("{k4}", &tier.weights.design.to_string())
        .replace("{k5}", &tier.weights.strategic.to_string())
        .replace("{no_code_instruction}", NO_CODE_INSTRUCTION)
        .replace("{diversity_instruction}", DIVERSITY_INSTRUCTION)
        .replace("{json_only_instruction}", JSON_ONLY_INSTRUCTION);

    SlotPrompt {
        system: GENERATION_SYSTEM,
        user,
    }
}

fn or_unspecified(text: &str) -> &str {
    if text.trim().is_empty() {
        "Not specified"
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::rubric::resolve_tier;

    fn context() -> JobContext<'static> {
        JobContext {
            posting_title: "2026 Contracted IT Personnel Intake",
            general_requirements: "BSc in engineering; 5 years experience",
            role_name: "Network Engineer",
            position_count: 3,
            special_requirements: "BGP, OSPF, firewall policy design, SD-WAN",
        }
    }

    #[test]
    fn test_prompt_carries_job_context_and_slot_position() {
        let tier = resolve_tier(3.0);
        let prompt = build_slot_prompt(&context(), tier, "Theoretical Knowledge Questions", 2, 5);

        assert!(prompt.user.contains("2026 Contracted IT Personnel Intake"));
        assert!(prompt.user.contains("Network Engineer"));
        assert!(prompt.user.contains("question 2 of 5"));
        assert!(prompt.user.contains("Theoretical Knowledge Questions"));
        assert!(prompt.user.contains("BGP, OSPF"));
    }

    #[test]
    fn test_prompt_carries_tier_weights() {
        let tier = resolve_tier(3.0);
        let prompt = build_slot_prompt(&context(), tier, "Theory", 1, 1);

        // 3x tier: 15/25/35/20/5
        assert!(prompt.user.contains("Recall (15%)"));
        assert!(prompt.user.contains("Applied (25%)"));
        assert!(prompt.user.contains("Troubleshooting (35%)"));
        assert!(prompt.user.contains("Design (20%)"));
        assert!(prompt.user.contains("Strategic (5%)"));
        assert!(prompt.user.contains("3x band"));
    }

    #[test]
    fn test_prompt_embeds_hard_constraints() {
        let tier = resolve_tier(2.0);
        let prompt = build_slot_prompt(&context(), tier, "Theory", 1, 1);

        assert!(prompt.user.contains("Asking for code is strictly forbidden"));
        assert!(prompt.user.contains("different topic"));
        assert!(prompt.user.contains("valid JSON object"));
        assert!(prompt.user.contains("\"expected_answer\""));
        assert!(prompt.user.contains("Keywords:"));
        assert!(!prompt.user.contains("{k1}"), "no unexpanded placeholders");
        assert!(!prompt.user.contains("{category_name}"));
    }

    #[test]
    fn test_empty_requirements_render_as_unspecified() {
        let tier = resolve_tier(2.0);
        let ctx = JobContext {
            general_requirements: "  ",
            special_requirements: "",
            ..context()
        };
        let prompt = build_slot_prompt(&ctx, tier, "Theory", 1, 1);
        assert!(prompt.user.contains("Not specified"));
    }

    #[test]
    fn test_system_instruction_is_fixed() {
        let tier = resolve_tier(4.5);
        let prompt = build_slot_prompt(&context(), tier, "Theory", 1, 1);
        assert!(prompt.system.contains("human-resources specialist"));
        assert!(prompt.system.contains("strictly forbidden"));
    }
}
