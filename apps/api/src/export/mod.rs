//! Export — renders persisted questions, grouped by role and category, into
//! downloadable Word documents for the interview jury.
//!
//! One document per (role, candidate slot, variant): the question sheet holds
//! only the questions; the answer sheet adds the expected answers. Candidate
//! slot `n` receives the n-th question of each category, matching how the
//! question volume was planned per invited candidate.

pub mod handlers;

use std::collections::BTreeMap;
use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, Paragraph, Run};

use crate::errors::AppError;
use crate::models::posting::{PostingRow, RoleRow};
use crate::models::question::QuestionRow;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Which sheet to render for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetVariant {
    Questions,
    Answers,
}

impl SheetVariant {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "" | "questions" => Ok(SheetVariant::Questions),
            "answers" => Ok(SheetVariant::Answers),
            other => Err(AppError::Validation(format!(
                "Unknown export variant '{other}'; expected 'questions' or 'answers'"
            ))),
        }
    }

    fn title(self) -> &'static str {
        match self {
            SheetVariant::Questions => "INTERVIEW QUESTIONS",
            SheetVariant::Answers => "INTERVIEW QUESTIONS AND ANSWERS",
        }
    }

    /// Short tag used in the exported filename: S for question sheets,
    /// A for answer sheets.
    pub fn file_tag(self) -> &'static str {
        match self {
            SheetVariant::Questions => "S",
            SheetVariant::Answers => "A",
        }
    }
}

/// Picks the candidate's question from each category: candidate `n` (1-based)
/// gets the n-th question, in category order. Categories with fewer questions
/// are skipped for that candidate.
pub fn select_candidate_questions(
    by_category: &BTreeMap<String, Vec<QuestionRow>>,
    candidate: i64,
) -> Vec<(&String, &QuestionRow)> {
    if candidate < 1 {
        return Vec::new();
    }
    by_category
        .iter()
        .filter_map(|(code, rows)| rows.get(candidate as usize - 1).map(|q| (code, q)))
        .collect()
}

/// The highest candidate slot any category can serve.
pub fn max_candidate_slot(by_category: &BTreeMap<String, Vec<QuestionRow>>) -> usize {
    by_category.values().map(Vec::len).max().unwrap_or(0)
}

/// Renders one candidate sheet to docx bytes.
pub fn render_candidate_sheet(
    posting: &PostingRow,
    role: &RoleRow,
    category_names: &BTreeMap<String, String>,
    by_category: &BTreeMap<String, Vec<QuestionRow>>,
    candidate: i64,
    variant: SheetVariant,
) -> Result<Vec<u8>, AppError> {
    let mut docx = Docx::new()
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(variant.title()).bold().size(40))
                .align(AlignmentType::Center),
        )
        .add_paragraph(Paragraph::new())
        .add_paragraph(heading("Posting"))
        .add_paragraph(body_line(format!("Title: {}", posting.title)))
        .add_paragraph(body_line(format!(
            "Created: {}",
            posting.created_at.format("%d.%m.%Y")
        )))
        .add_paragraph(body_line(format!(
            "Position: {} ({}x)",
            role.name, role.pay_multiplier
        )))
        .add_paragraph(body_line(format!("Candidate no: {candidate}")))
        .add_paragraph(Paragraph::new());

    for (code, question) in select_candidate_questions(by_category, candidate) {
        let category_name = category_names.get(code).unwrap_or(code);

        docx = docx
            .add_paragraph(heading(category_name.as_str()))
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("1. ").bold())
                    .add_run(Run::new().add_text(question.question_text.as_str())),
            );

        if variant == SheetVariant::Answers && !question.expected_answer.is_empty() {
            docx = docx.add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("Expected answer: ").bold())
                    .add_run(Run::new().add_text(question.expected_answer.as_str())),
            );
        }
        docx = docx.add_paragraph(Paragraph::new());
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| AppError::Document(format!("Failed to pack docx: {e}")))?;
    Ok(buffer.into_inner())
}

/// Filename for one exported sheet, e.g. `Network_Engineer 3x S1.docx`.
pub fn sheet_filename(role: &RoleRow, candidate: i64, variant: SheetVariant) -> String {
    format!(
        "{} {}x {}{candidate}.docx",
        sanitize_filename(&role.name),
        role.pay_multiplier,
        variant.file_tag()
    )
}

/// Reduces a free-text name to a filesystem- and header-safe ASCII token.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "export".to_string()
    } else {
        cleaned
    }
}

fn heading(text: impl Into<String>) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text.into()).bold().size(28))
}

fn body_line(text: String) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn question(code: &str, text: &str) -> QuestionRow {
        QuestionRow {
            id: Uuid::new_v4(),
            role_id: Uuid::new_v4(),
            posting_id: Uuid::new_v4(),
            category_code: code.to_string(),
            question_text: text.to_string(),
            difficulty_label: "3x".to_string(),
            expected_answer: "Expected.".to_string(),
            scoring_notes: String::new(),
            model_name: "gpt-4o-mini".to_string(),
            created_at: Utc::now(),
        }
    }

    fn grouped() -> BTreeMap<String, Vec<QuestionRow>> {
        let mut map = BTreeMap::new();
        map.insert(
            "theory".to_string(),
            vec![question("theory", "T1"), question("theory", "T2")],
        );
        map.insert("applied".to_string(), vec![question("applied", "A1")]);
        map
    }

    #[test]
    fn test_candidate_one_gets_first_question_of_each_category() {
        let grouped = grouped();
        let selected = select_candidate_questions(&grouped, 1);
        let texts: Vec<&str> = selected
            .iter()
            .map(|(_, q)| q.question_text.as_str())
            .collect();
        // BTreeMap iterates in category-code order.
        assert_eq!(texts, ["A1", "T1"]);
    }

    #[test]
    fn test_candidate_beyond_short_category_skips_it() {
        let grouped = grouped();
        let selected = select_candidate_questions(&grouped, 2);
        let texts: Vec<&str> = selected
            .iter()
            .map(|(_, q)| q.question_text.as_str())
            .collect();
        assert_eq!(texts, ["T2"]);
    }

    #[test]
    fn test_candidate_zero_or_negative_selects_nothing() {
        let grouped = grouped();
        assert!(select_candidate_questions(&grouped, 0).is_empty());
        assert!(select_candidate_questions(&grouped, -3).is_empty());
    }

    #[test]
    fn test_max_candidate_slot() {
        assert_eq!(max_candidate_slot(&grouped()), 2);
        assert_eq!(max_candidate_slot(&BTreeMap::new()), 0);
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!(SheetVariant::parse("").unwrap(), SheetVariant::Questions);
        assert_eq!(
            SheetVariant::parse("questions").unwrap(),
            SheetVariant::Questions
        );
        assert_eq!(SheetVariant::parse("answers").unwrap(), SheetVariant::Answers);
        assert!(SheetVariant::parse("pdf").is_err());
    }

    #[test]
    fn test_sanitize_filename_replaces_non_ascii() {
        assert_eq!(sanitize_filename("Yazılım Uzmanı"), "Yaz_l_m_Uzman_");
        assert_eq!(sanitize_filename("Network Engineer"), "Network_Engineer");
        assert_eq!(sanitize_filename("  "), "export");
    }

    #[test]
    fn test_rendered_sheet_is_a_zip_container() {
        let posting = PostingRow {
            id: Uuid::new_v4(),
            title: "Posting".to_string(),
            body: String::new(),
            general_requirements: String::new(),
            created_at: Utc::now(),
        };
        let role = RoleRow {
            id: Uuid::new_v4(),
            posting_id: posting.id,
            name: "Developer".to_string(),
            pay_multiplier: 3.0,
            position_count: 1,
            special_requirements: String::new(),
            created_at: Utc::now(),
        };
        let names = BTreeMap::from([("theory".to_string(), "Theory".to_string())]);

        let bytes = render_candidate_sheet(
            &posting,
            &role,
            &names,
            &grouped(),
            1,
            SheetVariant::Answers,
        )
        .unwrap();

        // docx files are zip containers: PK magic.
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[..2], b"PK");
    }
}
