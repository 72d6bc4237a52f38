// src/scoring/status.rs

use serde::Serialize;

use crate::{
    error::AppError,
    models::{answer::Answer, question::Question},
    scoring::{ScoringCategory, classify, load_attempt},
    store::ScoringStore,
};

/// How far grading of an attempt has progressed. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoringStatus {
    pub attempt_id: i64,
    /// Answered questions.
    pub total_questions: usize,
    pub auto_scored: usize,
    pub pending_auto: usize,
    pub manually_scored: usize,
    pub pending_manual: usize,
    pub auto_scoring_complete: bool,
    pub manual_scoring_complete: bool,
    pub overall_complete: bool,
}

pub fn status_of(attempt_id: i64, answered: &[(Answer, Question)]) -> ScoringStatus {
    let mut auto_scored = 0;
    let mut pending_auto = 0;
    let mut manually_scored = 0;
    let mut pending_manual = 0;

    for (answer, question) in answered {
        match (classify(&question.question_type), answer.is_scored()) {
            (ScoringCategory::Auto, true) => auto_scored += 1,
            (ScoringCategory::Auto, false) => pending_auto += 1,
            (ScoringCategory::Manual, true) => manually_scored += 1,
            (ScoringCategory::Manual, false) => pending_manual += 1,
        }
    }

    let auto_scoring_complete = pending_auto == 0;
    let manual_scoring_complete = pending_manual == 0;

    ScoringStatus {
        attempt_id,
        total_questions: answered.len(),
        auto_scored,
        pending_auto,
        manually_scored,
        pending_manual,
        auto_scoring_complete,
        manual_scoring_complete,
        overall_complete: auto_scoring_complete && manual_scoring_complete,
    }
}

/// Reports scoring progress for one attempt from the current answer rows.
pub async fn get_scoring_status(
    store: &dyn ScoringStore,
    attempt_id: i64,
) -> Result<ScoringStatus, AppError> {
    let ctx = load_attempt(store, attempt_id).await?;
    Ok(status_of(attempt_id, &ctx.answered))
}
