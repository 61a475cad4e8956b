// All model prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System instruction for question generation. Sent with every slot.
pub const GENERATION_SYSTEM: &str = "You are a human-resources specialist preparing \
    structured, assessable interview questions for contracted IT personnel hiring. \
    Every question you produce is shaped by a specific position, a specific category \
    (e.g. theoretical knowledge, practical application, professional experience) and a \
    prescribed difficulty level. \
    Questions must be purely explanation, analysis, reasoning or experience based. \
    Never ask the candidate to write code, produce an algorithm, complete a function or \
    supply a script; such questions are strictly forbidden and you will not produce them. \
    Question topics are drawn from the technologies named in the position's special \
    requirements, and no topic is used twice. \
    The difficulty of each question follows the position's pay multiplier (e.g. 2x, 3x, \
    4x): a 2x candidate is asked for fundamental conceptual explanation while a 4x \
    candidate is asked for architectural design or strategic decision analysis. The \
    exact layer distribution is provided to you per request. \
    Each question focuses on a single technology with a clear topic, followed by an \
    expected answer addressed to the interview jury. The expected answer describes, from \
    the evaluator's perspective, what knowledge, skill or approach the candidate is \
    expected to demonstrate; it is never written in the candidate's voice. The answer \
    closes with the key concepts. \
    All output is returned as JSON in exactly the shape you are given.";

/// Per-slot user prompt template.
/// Replace: {posting_title}, {general_requirements}, {role_name}, {tier_label},
///          {position_count}, {special_requirements}, {tier_name},
///          {experience_years}, {category_name}, {slot_index}, {slot_total},
///          {k1}..{k5}, {no_code_instruction}, {diversity_instruction},
///          {json_only_instruction}
pub const SLOT_PROMPT_TEMPLATE: &str = r#"POSTING TITLE: {posting_title}

GENERAL REQUIREMENTS:
{general_requirements}

ROLE: {role_name}
PAY MULTIPLIER: {tier_label}
POSITION COUNT: {position_count}
SPECIAL REQUIREMENTS:
{special_requirements}

Produce question {slot_index} of {slot_total} in the "{category_name}" category for this position, together with its expected answer.

{no_code_instruction}

{diversity_instruction}

The question's difficulty must match the knowledge depth of the {tier_label} band ({tier_name}, {experience_years}). Select the question from the appropriate layer of this weight distribution:

- Recall ({k1}%): definitions and concept explanation (no code)
- Applied ({k2}%): configuration, method choice, usage recommendations (no code)
- Troubleshooting ({k3}%): log analysis, fault identification and evaluation (no code)
- Design ({k4}%): architecture, technology comparison, scalability concerns
- Strategic ({k5}%): process improvement, technology selection, leadership-level reasoning

The question itself must be direct, clear and on-topic; do not pad it with phrases like "the candidate is expected to explain" — that belongs in the expected answer.

Write the expected answer in an informative tone for the jury, from the evaluator's perspective, never in the candidate's voice, in this shape:

"The candidate is expected to demonstrate [expected knowledge/experience] of [chosen topic]. [Detailed explanation and examples]."

End the expected answer with a blank line followed by a single line of 4-5 comma-separated keywords.

{json_only_instruction}

Return exactly this JSON shape (no other format is accepted):

{
  "question": "question text here",
  "expected_answer": "expected answer here\n\nKeywords: word1, word2, word3, word4"
}

IMPORTANT: the keyword line belongs inside expected_answer, never as a separate field!"#;
