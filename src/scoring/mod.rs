// src/scoring/mod.rs

//! Scoring engine: classification, automatic and manual scoring, attempt
//! aggregation, status, correction and competency reporting.
//!
//! Within one attempt the order is always: answer write, scoring write, then
//! aggregation. Aggregates are recomputed from the stored answers every time.

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{
        answer::Answer,
        attempt::{Assessment, Attempt},
        question::Question,
    },
    store::ScoringStore,
};

pub mod aggregate;
pub mod classify;
pub mod competency;
pub mod correction;
pub mod grading;
pub mod objective;
pub mod policy;
pub mod report;
pub mod rubric;
pub mod status;

pub use aggregate::{calculate_attempt_score, complete_attempt};
pub use classify::{ScoringCategory, classify};
pub use competency::{get_question_competency_mapping, save_question_competency_mapping};
pub use correction::{RepairScope, repair_misscored_answers, rescore_assessment};
pub use grading::{get_ungraded_responses, grade_with_rubric, update_manual_score};
pub use objective::score_objective_questions;
pub use report::generate_assessment_report;
pub use status::get_scoring_status;

/// An attempt with its answers joined to their questions.
pub(crate) struct AttemptContext {
    pub attempt: Attempt,
    pub assessment: Option<Assessment>,
    /// Every question of the assessment, answered or not, ordered by id.
    pub questions: Vec<Question>,
    /// Answered questions, ordered by answer id.
    pub answered: Vec<(Answer, Question)>,
}

pub(crate) async fn load_attempt(
    store: &dyn ScoringStore,
    attempt_id: i64,
) -> Result<AttemptContext, AppError> {
    let attempt = store
        .attempt(attempt_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", attempt_id)))?;

    let assessment = store.assessment(attempt.assessment_id).await?;
    if assessment.is_none() {
        tracing::warn!(
            "Attempt {} references missing assessment {}; using default passing score",
            attempt_id,
            attempt.assessment_id
        );
    }

    let questions = store.questions_for_assessment(attempt.assessment_id).await?;
    let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let answers = store.answers_for_attempt(attempt_id).await?;
    let mut answered = Vec::with_capacity(answers.len());
    for answer in answers {
        match by_id.get(&answer.question_id) {
            Some(question) => answered.push((answer, (*question).clone())),
            None => tracing::warn!(
                "Answer {} references question {} outside assessment {}; ignoring it",
                answer.id,
                answer.question_id,
                attempt.assessment_id
            ),
        }
    }

    Ok(AttemptContext {
        attempt,
        assessment,
        questions,
        answered,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders shared by the scoring unit tests.

    use crate::models::{
        answer::Answer,
        attempt::{Assessment, Attempt},
        question::{Question, QuestionOption, QuestionType},
    };
    use crate::store::MemoryStore;

    pub fn question(id: i64, tag: &str, points_possible: f64) -> Question {
        Question {
            id,
            assessment_id: 1,
            question_type: QuestionType::from(tag),
            content: format!("Question {id}"),
            points_possible,
            correct_answer: None,
        }
    }

    pub fn option(id: i64, question_id: i64, is_correct: bool, points: Option<f64>) -> QuestionOption {
        QuestionOption {
            id,
            question_id,
            label: format!("Option {id}"),
            is_correct,
            points,
        }
    }

    pub fn answer(id: i64, question_id: i64) -> Answer {
        Answer {
            id,
            attempt_id: 1,
            question_id,
            selected_option_id: None,
            rating: None,
            response_text: None,
            media_url: None,
            points_awarded: None,
            is_correct: None,
            scored_at: None,
            graded_by: None,
        }
    }

    pub fn attempt(id: i64) -> Attempt {
        Attempt {
            id,
            assessment_id: 1,
            score: None,
            percentage: None,
            passed: None,
            completed_at: None,
        }
    }

    /// Assessment 1 (passing 70) with attempt 1 and:
    /// * Q1 multiple choice (2 pts), option 5 correct, answer 1 selects 5
    /// * Q2 likert (1 pt), answer 2 rates 6
    /// * Q3 essay (10 pts), answer 3 ungraded
    /// * Q4 forced choice (3 pts), never answered
    pub async fn scenario_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_assessment(Assessment {
                id: 1,
                title: "Customer Support Associate".into(),
                passing_score: Some(70.0),
            })
            .await;
        store.insert_attempt(attempt(1)).await;

        store.insert_question(question(1, "multiple_choice", 2.0)).await;
        store.insert_option(option(4, 1, false, None)).await;
        store.insert_option(option(5, 1, true, None)).await;
        store.insert_question(question(2, "likert_scale", 1.0)).await;
        store.insert_question(question(3, "essay", 10.0)).await;
        store.insert_question(question(4, "forced_choice", 3.0)).await;

        store
            .insert_answer(Answer {
                selected_option_id: Some(5),
                ..answer(1, 1)
            })
            .await;
        store
            .insert_answer(Answer {
                rating: Some(6),
                ..answer(2, 2)
            })
            .await;
        store
            .insert_answer(Answer {
                response_text: Some("I would first acknowledge the customer's frustration.".into()),
                ..answer(3, 3)
            })
            .await;

        store
    }
}
