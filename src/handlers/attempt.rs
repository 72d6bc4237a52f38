// src/handlers/attempt.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::answer::GradingScope,
    scoring::{
        calculate_attempt_score, complete_attempt, generate_assessment_report,
        get_scoring_status, get_ungraded_responses, score_objective_questions,
    },
    store::SharedStore,
};

/// Runs the objective scorer over one attempt.
pub async fn score_objective(
    State(store): State<SharedStore>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let summary = score_objective_questions(store.as_ref(), attempt_id).await?;
    Ok(Json(summary))
}

/// Recomputes and stores the attempt's score, percentage and pass/fail.
pub async fn calculate_score(
    State(store): State<SharedStore>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let score = calculate_attempt_score(store.as_ref(), attempt_id).await?;
    Ok(Json(score))
}

/// Closes the attempt and scores everything that can be scored automatically.
pub async fn complete(
    State(store): State<SharedStore>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let completed = complete_attempt(store.as_ref(), attempt_id).await?;
    Ok(Json(completed))
}

pub async fn scoring_status(
    State(store): State<SharedStore>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let status = get_scoring_status(store.as_ref(), attempt_id).await?;
    Ok(Json(status))
}

/// Per-question breakdown with competency rollup.
pub async fn report(
    State(store): State<SharedStore>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let report = generate_assessment_report(store.as_ref(), attempt_id).await?;
    Ok(Json(report))
}

/// Grading queue for one attempt.
pub async fn ungraded(
    State(store): State<SharedStore>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let pending = get_ungraded_responses(store.as_ref(), GradingScope::Attempt(attempt_id)).await?;
    Ok(Json(pending))
}
