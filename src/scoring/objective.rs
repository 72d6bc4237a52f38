// src/scoring/objective.rs

use chrono::Utc;
use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        answer::{Answer, ObjectiveScore},
        question::{Question, QuestionOption, QuestionType},
    },
    scoring::{
        ScoringCategory, classify, load_attempt,
        policy::POLICY,
    },
    store::ScoringStore,
};

/// Outcome of one objective scoring pass over an attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectiveScoringSummary {
    pub attempt_id: i64,
    /// Answers whose stored score was written by this pass.
    pub scored: usize,
    /// Answers whose stored score already matched.
    pub unchanged: usize,
    /// Answers skipped because the store failed on them.
    pub failed: Vec<i64>,
}

/// Scores one answer from the current question and option rows.
///
/// Returns `None` for question types that are not scored automatically.
/// Invalid or missing responses score zero; they are never an error.
pub fn score_answer(
    question: &Question,
    options: &[QuestionOption],
    answer: &Answer,
) -> Option<ObjectiveScore> {
    if classify(&question.question_type) != ScoringCategory::Auto {
        return None;
    }

    let score = match &question.question_type {
        QuestionType::MultipleChoice => score_multiple_choice(question, options, answer),
        QuestionType::LikertScale => score_likert(question, answer.rating),
        QuestionType::ForcedChoice | QuestionType::EthicalChoice | QuestionType::ScenarioChoice => {
            score_option_credit(question, options, answer)
        }
        _ => return None,
    };

    Some(score)
}

fn incorrect() -> ObjectiveScore {
    ObjectiveScore {
        points_awarded: 0.0,
        is_correct: Some(false),
    }
}

/// All or nothing: full marks iff the selected option is flagged correct.
fn score_multiple_choice(
    question: &Question,
    options: &[QuestionOption],
    answer: &Answer,
) -> ObjectiveScore {
    let Some(selected) = answer.selected_option_id else {
        return incorrect();
    };

    let correct = match options.iter().find(|o| o.id == selected) {
        Some(option) => option.is_correct,
        // Option rows missing: fall back to the question's answer key.
        None => question
            .correct_answer
            .as_deref()
            .is_some_and(|key| key.trim() == selected.to_string()),
    };

    ObjectiveScore {
        points_awarded: if correct { question.points_possible } else { 0.0 },
        is_correct: Some(correct),
    }
}

/// Any in-range rating earns full marks; the scale is a data-quality gate.
fn score_likert(question: &Question, rating: Option<i32>) -> ObjectiveScore {
    match rating {
        Some(r) if POLICY.likert_in_range(r) => ObjectiveScore {
            points_awarded: question.points_possible,
            is_correct: Some(true),
        },
        _ => incorrect(),
    }
}

/// Per-option credit, clamped to `[0, points_possible]`.
fn score_option_credit(
    question: &Question,
    options: &[QuestionOption],
    answer: &Answer,
) -> ObjectiveScore {
    let Some(option) = answer
        .selected_option_id
        .and_then(|selected| options.iter().find(|o| o.id == selected))
    else {
        return incorrect();
    };

    let max = question.points_possible.max(0.0);
    let points = match option.points {
        Some(points) if points.is_finite() => points.clamp(0.0, max),
        Some(_) => 0.0,
        None if option.is_correct => max,
        None => 0.0,
    };

    ObjectiveScore {
        points_awarded: points,
        is_correct: Some(option.is_correct),
    }
}

fn needs_options(question_type: &QuestionType) -> bool {
    !matches!(question_type, QuestionType::LikertScale)
}

/// Runs the objective scorer over every answered AUTO question of an attempt.
///
/// Scores are recomputed from scratch; a store failure on one answer is logged
/// and that answer skipped.
pub async fn score_objective_questions(
    store: &dyn ScoringStore,
    attempt_id: i64,
) -> Result<ObjectiveScoringSummary, AppError> {
    let ctx = load_attempt(store, attempt_id).await?;
    let mut summary = ObjectiveScoringSummary {
        attempt_id,
        ..Default::default()
    };

    for (answer, question) in &ctx.answered {
        if classify(&question.question_type) != ScoringCategory::Auto {
            continue;
        }

        match score_one(store, answer, question).await {
            Ok(true) => summary.scored += 1,
            Ok(false) => summary.unchanged += 1,
            Err(e) => {
                tracing::warn!(
                    "Skipping answer {} of attempt {} during objective scoring: {}",
                    answer.id,
                    attempt_id,
                    e
                );
                summary.failed.push(answer.id);
            }
        }
    }

    tracing::info!(
        "Objective scoring for attempt {}: {} written, {} unchanged, {} failed",
        attempt_id,
        summary.scored,
        summary.unchanged,
        summary.failed.len()
    );

    Ok(summary)
}

/// Returns whether a new score was written.
async fn score_one(
    store: &dyn ScoringStore,
    answer: &Answer,
    question: &Question,
) -> Result<bool, AppError> {
    let options = if needs_options(&question.question_type) {
        store.options_for_question(question.id).await?
    } else {
        Vec::new()
    };

    let Some(score) = score_answer(question, &options, answer) else {
        return Ok(false);
    };

    if answer.points_awarded == Some(score.points_awarded) && answer.is_correct == score.is_correct
    {
        return Ok(false);
    }

    store
        .record_objective_score(answer.id, &score, Utc::now())
        .await?;
    Ok(true)
}
