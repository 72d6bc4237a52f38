// src/scoring/correction.rs

//! Batch repair and re-scoring.
//!
//! Attempts share no state, so they are processed concurrently. Within one
//! attempt the objective scorer always finishes before the aggregator reads.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    error::AppError,
    models::{attempt::AttemptScore, question::Question},
    scoring::{
        ScoringCategory, aggregate::calculate_attempt_score, classify,
        objective::score_objective_questions,
    },
    store::SharedStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum RepairScope {
    #[default]
    All,
    Assessment(i64),
}

impl RepairScope {
    fn assessment_id(self) -> Option<i64> {
        match self {
            RepairScope::All => None,
            RepairScope::Assessment(id) => Some(id),
        }
    }
}

/// A row or attempt the batch had to skip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub attempt_id: Option<i64>,
    pub answer_id: Option<i64>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Manual answers whose stale score was cleared.
    pub answers_reset: Vec<i64>,
    /// Fresh aggregates, ordered by attempt id.
    pub attempts_rescored: Vec<AttemptScore>,
    pub failures: Vec<BatchFailure>,
}

/// Clears scores on manual-type answers that no grader ever graded, then
/// re-scores every affected attempt.
///
/// Running it again over repaired data changes nothing.
pub async fn repair_misscored_answers(
    store: &SharedStore,
    scope: RepairScope,
    concurrency: usize,
) -> Result<BatchReport, AppError> {
    let candidates = store
        .scored_answers_without_grader(scope.assessment_id())
        .await?;

    let mut report = BatchReport::default();
    let mut questions: HashMap<i64, Option<Question>> = HashMap::new();
    let mut affected = BTreeSet::new();

    for answer in candidates {
        let question = match questions.get(&answer.question_id) {
            Some(cached) => cached.clone(),
            None => match store.question(answer.question_id).await {
                Ok(found) => {
                    questions.insert(answer.question_id, found.clone());
                    found
                }
                Err(e) => {
                    tracing::warn!("Skipping answer {}: cannot load its question: {}", answer.id, e);
                    report.failures.push(BatchFailure {
                        attempt_id: Some(answer.attempt_id),
                        answer_id: Some(answer.id),
                        error: e.to_string(),
                    });
                    continue;
                }
            },
        };

        let Some(question) = question else {
            tracing::warn!("Answer {} references missing question {}", answer.id, answer.question_id);
            report.failures.push(BatchFailure {
                attempt_id: Some(answer.attempt_id),
                answer_id: Some(answer.id),
                error: format!("question {} not found", answer.question_id),
            });
            continue;
        };
        if classify(&question.question_type) != ScoringCategory::Manual {
            continue;
        }

        match store.clear_answer_score(answer.id).await {
            Ok(()) => {
                tracing::info!(
                    "Cleared ungraded score {:?} on {} answer {} (attempt {})",
                    answer.points_awarded,
                    question.question_type,
                    answer.id,
                    answer.attempt_id
                );
                report.answers_reset.push(answer.id);
                affected.insert(answer.attempt_id);
            }
            Err(e) => {
                tracing::warn!("Failed to clear score on answer {}: {}", answer.id, e);
                report.failures.push(BatchFailure {
                    attempt_id: Some(answer.attempt_id),
                    answer_id: Some(answer.id),
                    error: e.to_string(),
                });
            }
        }
    }

    let (rescored, failures) = rescore_attempts(store, affected, concurrency).await;
    report.attempts_rescored = rescored;
    report.failures.extend(failures);

    tracing::info!(
        "Score repair finished: {} answers reset, {} attempts rescored, {} failures",
        report.answers_reset.len(),
        report.attempts_rescored.len(),
        report.failures.len()
    );

    Ok(report)
}

/// Re-runs the objective scorer and the aggregator over every attempt of an assessment.
pub async fn rescore_assessment(
    store: &SharedStore,
    assessment_id: i64,
    concurrency: usize,
) -> Result<BatchReport, AppError> {
    store.assessment(assessment_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("Assessment {} not found", assessment_id))
    })?;

    let attempt_ids = store
        .attempts_for_assessment(assessment_id)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect::<BTreeSet<_>>();

    let (rescored, failures) = rescore_attempts(store, attempt_ids, concurrency).await;

    tracing::info!(
        "Rescored {} attempts of assessment {} ({} failures)",
        rescored.len(),
        assessment_id,
        failures.len()
    );

    Ok(BatchReport {
        answers_reset: Vec::new(),
        attempts_rescored: rescored,
        failures,
    })
}

async fn rescore_attempts(
    store: &SharedStore,
    attempt_ids: BTreeSet<i64>,
    concurrency: usize,
) -> (Vec<AttemptScore>, Vec<BatchFailure>) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for attempt_id in attempt_ids {
        let store = Arc::clone(store);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = rescore_attempt(&store, attempt_id).await;
            (attempt_id, result)
        });
    }

    let mut rescored = Vec::new();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok((score, skipped)))) => {
                failures.extend(skipped);
                rescored.push(score);
            }
            Ok((attempt_id, Err(e))) => {
                tracing::warn!("Failed to rescore attempt {}: {}", attempt_id, e);
                failures.push(BatchFailure {
                    attempt_id: Some(attempt_id),
                    answer_id: None,
                    error: e.to_string(),
                });
            }
            Err(e) => {
                tracing::error!("Rescoring task aborted: {}", e);
                failures.push(BatchFailure {
                    attempt_id: None,
                    answer_id: None,
                    error: e.to_string(),
                });
            }
        }
    }

    rescored.sort_by_key(|s| s.attempt_id);
    (rescored, failures)
}

/// Scorer, then aggregator, for one attempt.
async fn rescore_attempt(
    store: &SharedStore,
    attempt_id: i64,
) -> Result<(AttemptScore, Vec<BatchFailure>), AppError> {
    let summary = score_objective_questions(store.as_ref(), attempt_id).await?;
    let score = calculate_attempt_score(store.as_ref(), attempt_id).await?;

    let skipped = summary
        .failed
        .into_iter()
        .map(|answer_id| BatchFailure {
            attempt_id: Some(attempt_id),
            answer_id: Some(answer_id),
            error: "objective scoring write failed".to_string(),
        })
        .collect();

    Ok((score, skipped))
}
