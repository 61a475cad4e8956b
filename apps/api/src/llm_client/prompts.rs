// Shared prompt constants and prompt-building utilities.
// Each service that needs model calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with a single valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";

/// Hard rule embedded in every question-generation instruction: interview
/// questions never ask the candidate to produce code.
pub const NO_CODE_INSTRUCTION: &str = "\
    Asking for code is strictly forbidden. The question must not request any \
    code, algorithm, script, function, or code-completion exercise. The \
    candidate may only be asked for explanation, analysis, reasoning, \
    comparison, or an account of hands-on experience.";

/// Per-slot diversity rule: every slot within a category targets a different
/// sub-topic. This is a prompt-level constraint, not enforced in code.
pub const DIVERSITY_INSTRUCTION: &str = "\
    Each question must focus on a different topic drawn from the role's \
    special requirements. Never produce two questions on the same topic; each \
    one must touch a distinct technology or practice area of the position.";
