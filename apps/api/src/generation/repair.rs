//! Response repair — best-effort extraction of a (question, expected_answer)
//! pair from raw model output, which is frequently malformed JSON.
//!
//! The pipeline is an ordered list of independent, total transformation steps.
//! After each step the candidate is re-parsed and the pipeline short-circuits
//! on success, so a lossy later step (quote collapsing, tail reattachment)
//! never touches text that already parses. New malformation patterns get
//! appended as new steps without risking regressions on earlier ones.
//!
//! Invariant: `repair_response` is total. Every input, however malformed,
//! yields a usable pair — worst case the whole cleaned text becomes the
//! question and the expected answer stays empty.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// The recovered pair. `parsed` is false when the structured parse failed and
/// the raw-text fallback was used — a recovered condition, not a fatal one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedPair {
    pub question: String,
    pub expected_answer: String,
    pub parsed: bool,
}

/// Repairs one raw model response. Never panics, never errors.
pub fn repair_response(raw: &str) -> RepairedPair {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return RepairedPair {
            question: String::new(),
            expected_answer: String::new(),
            parsed: false,
        };
    }

    // Step 1-2: isolate the JSON object (fence-aware, then brace trim).
    let isolated = isolate_object(trimmed);
    if let Some(pair) = try_parse(&isolated) {
        return pair;
    }

    // Step 3: collapse doubled quote characters emitted as pre-escaped quotes.
    let collapsed = collapse_doubled_quotes(&isolated);
    if let Some(pair) = try_parse(&collapsed) {
        return pair;
    }

    // Step 4: reattach a keyword line emitted as a spurious sibling string
    // after expected_answer's value was closed too early.
    let reattached = reattach_orphan_tail(&collapsed);
    if let Some(pair) = try_parse(&reattached) {
        return pair;
    }

    // Fallback: the entire cleaned text becomes the question.
    RepairedPair {
        question: isolated,
        expected_answer: String::new(),
        parsed: false,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline steps — each total and side-effect-free
// ────────────────────────────────────────────────────────────────────────────

/// Isolates the JSON object candidate: prefers the body of a ```json fence,
/// otherwise normalizes known stray prefixes and trims to the outermost braces.
fn isolate_object(text: &str) -> String {
    if let Some(inner) = extract_fenced_object(text) {
        return inner;
    }
    let normalized = normalize_known_prefixes(text);
    trim_to_braces(&normalized).to_string()
}

/// Extracts the object between the first `{` after a ```json fence and the
/// last `}` before the closing fence (or end of text when unterminated).
fn extract_fenced_object(text: &str) -> Option<String> {
    let fence = text.find("```json")?;
    let body = &text[fence + "```json".len()..];
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    let first = body.find('{')?;
    let last = body.rfind('}')?;
    if first > last {
        return None;
    }
    Some(body[first..=last].to_string())
}

/// Normalizes prefixes observed in the wild: a bare ``` fence and the
/// `json (` / `"json (` openings some models substitute for `{`.
fn normalize_known_prefixes(text: &str) -> String {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("\"json (") {
        return format!("{{{rest}");
    }
    if let Some(rest) = text.strip_prefix("json (") {
        return format!("{{{rest}");
    }
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_suffix("```").unwrap_or(rest);
        return rest.trim().to_string();
    }
    text.to_string()
}

/// Trims to the substring spanning the first `{` through the last `}`.
/// Leaves the text untouched when no such span exists.
fn trim_to_braces(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(first), Some(last)) if first < last => &text[first..=last],
        _ => text,
    }
}

/// Collapses doubled quote characters (`""` → `"`) that arise when the model
/// emits already-escaped quotes. Lossy, which is why it only runs after a
/// clean parse has failed.
fn collapse_doubled_quotes(text: &str) -> String {
    text.replace("\"\"", "\"")
}

/// Matches `..."expected_answer": "value", "orphan tail"}` where the model
/// closed the answer string too early and emitted the keyword line as a
/// sibling string. An optional premature `}` before the comma is consumed.
static ORPHAN_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"("expected_answer"\s*:\s*"(?:[^"\\]|\\.)*)"\s*\}?\s*,\s*"((?:[^"\\]|\\.)*)"\s*\}?\s*$"#,
    )
    .expect("orphan tail pattern is valid")
});

/// Reattaches the orphan string's content onto the end of `expected_answer`'s
/// value and drops the spurious key, closing the object properly.
fn reattach_orphan_tail(text: &str) -> String {
    match ORPHAN_TAIL.captures(text) {
        Some(caps) => {
            let matched = caps.get(0).expect("capture 0 always present");
            let head = &caps[1];
            // Raw control characters in the orphan would still break the
            // parse; re-escape them while splicing.
            let orphan = caps[2].replace('\r', "").replace('\n', "\\n");
            format!("{}{head}{orphan}\"}}", &text[..matched.start()])
        }
        None => text.to_string(),
    }
}

/// Attempts a structured parse. Succeeds only for a JSON object; missing
/// fields default to empty strings.
fn try_parse(text: &str) -> Option<RepairedPair> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;
    Some(RepairedPair {
        question: object
            .get("question")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        expected_answer: object
            .get("expected_answer")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        parsed: true,
    })
}
