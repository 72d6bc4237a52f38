// src/scoring/grading.rs

//! Manual grading workflow: the pending queue and grade submission.
//!
//! The queue is never advanced locally. Callers re-fetch it after each
//! submission because other graders may be working the same queue.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::types::Json;

use crate::{
    error::AppError,
    models::{
        answer::{Answer, CriterionSelection, GradingRecord, GradingScope},
        attempt::AttemptScore,
        question::Question,
    },
    scoring::{
        ScoringCategory, aggregate::calculate_attempt_score, classify, policy::POLICY,
        rubric::rubric_for,
    },
    store::ScoringStore,
    utils::html::clean_html,
};

/// An answer waiting for a human grader.
#[derive(Debug, Clone, Serialize)]
pub struct PendingResponse {
    pub answer: Answer,
    pub question: Question,
    /// `false` means the grader can only submit a flat score.
    pub rubric_available: bool,
}

/// A flat score submitted by a grader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualScore {
    pub points: f64,
    /// Derived from the points when `None`.
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradingOutcome {
    pub answer_id: i64,
    pub points_awarded: f64,
    pub is_correct: Option<bool>,
    pub graded_by: i64,
    /// The attempt aggregate recomputed after the grade was committed.
    pub attempt: AttemptScore,
}

/// Manual-type answers with no score yet, in one attempt or across an assessment.
pub async fn get_ungraded_responses(
    store: &dyn ScoringStore,
    scope: GradingScope,
) -> Result<Vec<PendingResponse>, AppError> {
    let assessment_id = match scope {
        GradingScope::Attempt(attempt_id) => {
            store
                .attempt(attempt_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", attempt_id)))?
                .assessment_id
        }
        GradingScope::Assessment(assessment_id) => {
            store.assessment(assessment_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("Assessment {} not found", assessment_id))
            })?;
            assessment_id
        }
    };

    let questions: HashMap<i64, Question> = store
        .questions_for_assessment(assessment_id)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    let pending = store
        .unscored_answers(scope)
        .await?
        .into_iter()
        .filter_map(|answer| {
            let question = questions.get(&answer.question_id)?;
            if classify(&question.question_type) != ScoringCategory::Manual {
                return None;
            }
            Some(PendingResponse {
                rubric_available: rubric_for(&question.question_type).is_some(),
                question: question.clone(),
                answer,
            })
        })
        .collect();

    Ok(pending)
}

/// Commits a flat manual score, then recomputes the attempt aggregate.
///
/// Allowed for every manual type, including those without a rubric.
/// Zero is a valid grade.
pub async fn update_manual_score(
    store: &dyn ScoringStore,
    answer_id: i64,
    score: ManualScore,
    grader_id: i64,
) -> Result<GradingOutcome, AppError> {
    let (answer, question) = manual_target(store, answer_id).await?;

    if !score.points.is_finite() || score.points < 0.0 || score.points > question.points_possible {
        return Err(AppError::BadRequest(format!(
            "Points must be between 0 and {}",
            question.points_possible
        )));
    }

    let is_correct = score
        .is_correct
        .unwrap_or_else(|| POLICY.meets_correct_ratio(score.points, question.points_possible));

    let record = GradingRecord {
        answer_id,
        grader_id,
        points: score.points,
        is_correct: Some(is_correct),
        rubric: None,
        graded_at: Utc::now(),
    };

    commit_grade(store, &answer, record).await
}

/// Grades an answer against its type's rubric and commits the result.
///
/// The rubric score is scaled to the question's `points_possible`. Grader notes
/// are sanitized before they are stored.
pub async fn grade_with_rubric(
    store: &dyn ScoringStore,
    answer_id: i64,
    selections: &[CriterionSelection],
    grader_id: i64,
) -> Result<GradingOutcome, AppError> {
    let (answer, question) = manual_target(store, answer_id).await?;

    let rubric = rubric_for(&question.question_type).ok_or_else(|| {
        AppError::BadRequest(format!(
            "No rubric available for question type '{}'",
            question.question_type
        ))
    })?;

    let mut outcome = rubric.evaluate(selections)?;
    for grade in &mut outcome.grades {
        grade.note = grade
            .note
            .take()
            .map(|note| clean_html(note.trim()))
            .filter(|note| !note.is_empty());
    }

    let points = if outcome.max > 0 {
        outcome.score as f64 * question.points_possible / outcome.max as f64
    } else {
        0.0
    };

    let record = GradingRecord {
        answer_id,
        grader_id,
        points,
        is_correct: Some(outcome.is_correct),
        rubric: Some(Json(outcome.grades)),
        graded_at: Utc::now(),
    };

    commit_grade(store, &answer, record).await
}

async fn manual_target(
    store: &dyn ScoringStore,
    answer_id: i64,
) -> Result<(Answer, Question), AppError> {
    let answer = store
        .answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Answer {} not found", answer_id)))?;

    let question = store.question(answer.question_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("Question {} not found", answer.question_id))
    })?;

    if classify(&question.question_type) != ScoringCategory::Manual {
        return Err(AppError::BadRequest(format!(
            "Question type '{}' is scored automatically",
            question.question_type
        )));
    }

    Ok((answer, question))
}

async fn commit_grade(
    store: &dyn ScoringStore,
    answer: &Answer,
    record: GradingRecord,
) -> Result<GradingOutcome, AppError> {
    if answer.is_scored() {
        tracing::info!(
            "Answer {} regraded by {} (previous score {:?})",
            answer.id,
            record.grader_id,
            answer.points_awarded
        );
    }

    store.record_manual_grade(&record).await?;
    let attempt = calculate_attempt_score(store, answer.attempt_id).await?;

    Ok(GradingOutcome {
        answer_id: record.answer_id,
        points_awarded: record.points,
        is_correct: record.is_correct,
        graded_by: record.grader_id,
        attempt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        fixtures::{answer, attempt, question, scenario_store},
        objective::score_objective_questions,
        status::get_scoring_status,
    };
    use crate::models::attempt::Assessment;
    use crate::store::MemoryStore;

    fn select(criterion: &str, points: u32, note: Option<&str>) -> CriterionSelection {
        CriterionSelection {
            criterion: criterion.to_string(),
            points,
            note: note.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn queue_lists_only_ungraded_manual_answers() {
        let store = scenario_store().await;

        let pending = get_ungraded_responses(&store, GradingScope::Attempt(1)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].answer.id, 3);
        assert!(pending[0].rubric_available);

        let across = get_ungraded_responses(&store, GradingScope::Assessment(1)).await.unwrap();
        assert_eq!(across.len(), 1);
    }

    #[tokio::test]
    async fn unknown_types_are_queued_without_rubric() {
        let store = scenario_store().await;
        store.insert_question(question(9, "portfolio_upload", 5.0)).await;
        store
            .insert_answer(Answer {
                media_url: Some("uploads/portfolio.pdf".into()),
                ..answer(9, 9)
            })
            .await;

        let pending = get_ungraded_responses(&store, GradingScope::Attempt(1)).await.unwrap();
        let upload = pending.iter().find(|p| p.answer.id == 9).unwrap();
        assert!(!upload.rubric_available);

        let err = grade_with_rubric(&store, 9, &[select("content", 3, None)], 77)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        // A flat score, zero included, is still accepted.
        let outcome = update_manual_score(
            &store,
            9,
            ManualScore {
                points: 0.0,
                is_correct: None,
            },
            77,
        )
        .await
        .unwrap();
        assert_eq!(outcome.points_awarded, 0.0);
        assert_eq!(outcome.is_correct, Some(false));
    }

    #[tokio::test]
    async fn scenario_rubric_grade_completes_the_attempt() {
        let store = scenario_store().await;
        score_objective_questions(&store, 1).await.unwrap();

        let outcome = grade_with_rubric(
            &store,
            3,
            &[
                select("content", 3, Some("Good empathy <script>alert(1)</script>")),
                select("organization", 2, None),
                select("language", 1, Some("   ")),
            ],
            77,
        )
        .await
        .unwrap();

        assert_eq!(outcome.points_awarded, 6.0);
        assert_eq!(outcome.is_correct, Some(true));
        assert_eq!(outcome.attempt.total_possible, 13.0);
        assert_eq!(outcome.attempt.total_awarded, 8.0);
        assert!((outcome.attempt.percentage - 61.5).abs() < 0.05);
        assert!(!outcome.attempt.passed);

        let essay = store.answer(3).await.unwrap().unwrap();
        assert_eq!(essay.graded_by, Some(77));
        assert!(essay.scored_at.is_some());

        let record = store.grading_record(3).await.unwrap();
        let grades = record.rubric.unwrap().0;
        assert_eq!(grades[0].note.as_deref(), Some("Good empathy "));
        assert_eq!(grades[2].note, None);

        let status = get_scoring_status(&store, 1).await.unwrap();
        assert!(status.overall_complete);
        assert!(get_ungraded_responses(&store, GradingScope::Attempt(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn flat_scores_are_bounded() {
        let store = scenario_store().await;
        for points in [-1.0, 10.5, f64::NAN] {
            let err = update_manual_score(
                &store,
                3,
                ManualScore {
                    points,
                    is_correct: Some(true),
                },
                77,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{points}");
        }
        assert_eq!(store.answer(3).await.unwrap().unwrap().points_awarded, None);
    }

    #[tokio::test]
    async fn auto_answers_cannot_be_graded_manually() {
        let store = scenario_store().await;
        let err = update_manual_score(
            &store,
            1,
            ManualScore {
                points: 2.0,
                is_correct: Some(true),
            },
            77,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = scenario_store().await;
        let first = ManualScore {
            points: 4.0,
            is_correct: None,
        };
        let second = ManualScore {
            points: 9.0,
            is_correct: None,
        };
        update_manual_score(&store, 3, first, 77).await.unwrap();
        update_manual_score(&store, 3, second, 78).await.unwrap();

        let essay = store.answer(3).await.unwrap().unwrap();
        assert_eq!(essay.points_awarded, Some(9.0));
        assert_eq!(essay.graded_by, Some(78));
        assert_eq!(store.grading_record(3).await.unwrap().grader_id, 78);
    }

    #[tokio::test]
    async fn rubric_grade_exactly_at_threshold_passes() {
        let store = MemoryStore::new();
        store
            .insert_assessment(Assessment {
                id: 1,
                title: "Short essay".into(),
                passing_score: Some(70.0),
            })
            .await;
        store.insert_attempt(attempt(1)).await;
        store.insert_question(question(1, "essay", 3.0)).await;
        store
            .insert_answer(Answer {
                response_text: Some("Three short paragraphs.".into()),
                ..answer(1, 1)
            })
            .await;

        let selections = [
            select("content", 3, None),
            select("organization", 2, None),
            select("language", 2, None),
        ];
        let outcome = grade_with_rubric(&store, 1, &selections, 11).await.unwrap();

        assert!((outcome.points_awarded - 2.1).abs() < 1e-12);
        assert!((outcome.attempt.percentage - 70.0).abs() < 1e-9);
        assert!(outcome.attempt.passed);
        assert_eq!(store.attempt(1).await.unwrap().unwrap().passed, Some(true));
    }
}
