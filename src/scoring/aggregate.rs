// src/scoring/aggregate.rs

use chrono::Utc;
use serde::Serialize;

use crate::{
    error::AppError,
    models::{answer::Answer, attempt::AttemptScore, question::Question},
    scoring::{
        load_attempt, objective::score_objective_questions, policy::POLICY,
        status::{ScoringStatus, get_scoring_status},
    },
    store::ScoringStore,
};

/// Recomputes an attempt's totals from its answered questions.
///
/// Unanswered questions never reach this function, so they never count toward
/// `total_possible`. Ungraded answers count toward `total_possible` only.
pub fn summarize(attempt_id: i64, answered: &[(Answer, Question)], passing_score: f64) -> AttemptScore {
    let total_possible: f64 = answered.iter().map(|(_, q)| q.points_possible).sum();
    let total_awarded: f64 = answered.iter().filter_map(|(a, _)| a.points_awarded).sum();

    let percentage = if total_possible > 0.0 {
        total_awarded / total_possible * 100.0
    } else {
        0.0
    };

    AttemptScore {
        attempt_id,
        total_awarded,
        total_possible,
        percentage,
        // Nothing answered means nothing passed, whatever the threshold.
        passed: total_possible > 0.0 && POLICY.meets_passing_score(percentage, passing_score),
    }
}

/// Recomputes and persists `score`, `percentage` and `passed` for an attempt.
///
/// Must run after any scoring write for the attempt has been committed.
pub async fn calculate_attempt_score(
    store: &dyn ScoringStore,
    attempt_id: i64,
) -> Result<AttemptScore, AppError> {
    let ctx = load_attempt(store, attempt_id).await?;
    let passing_score = POLICY.passing_score(ctx.assessment.as_ref());

    let score = summarize(attempt_id, &ctx.answered, passing_score);
    store.save_attempt_score(&score).await?;

    tracing::debug!(
        "Attempt {} scored {}/{} ({:.1}%), passed: {}",
        attempt_id,
        score.total_awarded,
        score.total_possible,
        score.percentage,
        score.passed
    );

    Ok(score)
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedAttempt {
    pub score: AttemptScore,
    pub status: ScoringStatus,
}

/// Closes an attempt: stamps `completed_at`, scores the objective answers, then
/// aggregates.
pub async fn complete_attempt(
    store: &dyn ScoringStore,
    attempt_id: i64,
) -> Result<CompletedAttempt, AppError> {
    store.mark_attempt_completed(attempt_id, Utc::now()).await?;
    score_objective_questions(store, attempt_id).await?;
    let score = calculate_attempt_score(store, attempt_id).await?;
    let status = get_scoring_status(store, attempt_id).await?;

    tracing::info!(
        "Attempt {} completed; {} manual answers awaiting a grader",
        attempt_id,
        status.pending_manual
    );

    Ok(CompletedAttempt { score, status })
}
