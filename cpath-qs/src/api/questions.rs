//! Question bank endpoint

use axum::{extract::State, Json};
use cpath_common::questionnaire::Question;
use serde::Serialize;

use crate::AppState;

/// One screen of the questionnaire
#[derive(Debug, Serialize)]
pub struct SectionView {
    pub index: usize,
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub section_count: usize,
    pub question_count: usize,
    /// Selections allowed per question
    pub max_selections: usize,
    pub sections: Vec<SectionView>,
}

/// GET /api/questions
///
/// The full bank grouped by section, in display order.
pub async fn get_questions(State(state): State<AppState>) -> Json<QuestionsResponse> {
    let bank = &state.bank;
    let sections = bank
        .sections()
        .iter()
        .enumerate()
        .map(|(index, section)| SectionView {
            index,
            title: section.title.clone(),
            questions: bank.section_questions(index).cloned().collect(),
        })
        .collect();

    Json(QuestionsResponse {
        section_count: bank.section_count(),
        question_count: bank.question_count(),
        max_selections: cpath_common::AnswerMap::MAX_SELECTIONS,
        sections,
    })
}
