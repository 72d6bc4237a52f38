// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    config::Config,
    error::AppError,
    scoring::{RepairScope, repair_misscored_answers, rescore_assessment},
    store::SharedStore,
};

/// Optional narrowing for the repair run.
#[derive(Debug, Deserialize)]
pub struct RepairQuery {
    pub assessment_id: Option<i64>,
}

impl From<RepairQuery> for RepairScope {
    fn from(query: RepairQuery) -> Self {
        match query.assessment_id {
            Some(id) => RepairScope::Assessment(id),
            None => RepairScope::All,
        }
    }
}

/// Clears scores on manual answers that were never graded and re-scores the
/// affected attempts.
/// Admin only.
pub async fn repair_scoring(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    Query(query): Query<RepairQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = RepairScope::from(query);
    let report = repair_misscored_answers(&store, scope, config.batch_concurrency).await?;

    tracing::info!(
        "Repair {:?}: {} answers reset, {} attempts rescored, {} failures",
        scope,
        report.answers_reset.len(),
        report.attempts_rescored.len(),
        report.failures.len()
    );

    Ok(Json(report))
}

/// Re-scores every attempt of an assessment.
/// Admin only.
pub async fn rescore(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    Path(assessment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let report = rescore_assessment(&store, assessment_id, config.batch_concurrency).await?;
    Ok(Json(report))
}
