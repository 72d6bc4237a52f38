// src/store/mod.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        answer::{Answer, GradingRecord, GradingScope, ObjectiveScore},
        attempt::{Assessment, Attempt, AttemptScore},
        competency::CompetencyMapping,
        question::{Question, QuestionOption},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle used by handlers and batch jobs.
pub type SharedStore = Arc<dyn ScoringStore>;

/// Everything the scoring engine reads from and writes to the relational store.
///
/// Lists are returned ordered by id so that aggregates are summed in a stable order.
#[async_trait]
pub trait ScoringStore: Send + Sync {
    async fn assessment(&self, id: i64) -> Result<Option<Assessment>, AppError>;

    async fn attempt(&self, id: i64) -> Result<Option<Attempt>, AppError>;

    async fn attempts_for_assessment(&self, assessment_id: i64) -> Result<Vec<Attempt>, AppError>;

    async fn question(&self, id: i64) -> Result<Option<Question>, AppError>;

    async fn questions_for_assessment(&self, assessment_id: i64)
    -> Result<Vec<Question>, AppError>;

    async fn options_for_question(&self, question_id: i64)
    -> Result<Vec<QuestionOption>, AppError>;

    async fn answer(&self, id: i64) -> Result<Option<Answer>, AppError>;

    async fn answers_for_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>, AppError>;

    /// Answers in scope whose `points_awarded` is still null, of any question type.
    async fn unscored_answers(&self, scope: GradingScope) -> Result<Vec<Answer>, AppError>;

    /// Answers carrying a score with neither a grading record nor a `graded_by`,
    /// optionally limited to one assessment.
    async fn scored_answers_without_grader(
        &self,
        assessment_id: Option<i64>,
    ) -> Result<Vec<Answer>, AppError>;

    async fn record_objective_score(
        &self,
        answer_id: i64,
        score: &ObjectiveScore,
        scored_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Writes the answer's score, grader and timestamp together with the grading
    /// record. Either everything is committed or nothing is.
    async fn record_manual_grade(&self, record: &GradingRecord) -> Result<(), AppError>;

    /// Resets `points_awarded`, `is_correct` and `scored_at` to null.
    async fn clear_answer_score(&self, answer_id: i64) -> Result<(), AppError>;

    async fn save_attempt_score(&self, score: &AttemptScore) -> Result<(), AppError>;

    /// Sets `completed_at` unless it is already set.
    async fn mark_attempt_completed(
        &self,
        attempt_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn competency_mappings(
        &self,
        assessment_id: i64,
    ) -> Result<Vec<CompetencyMapping>, AppError>;

    async fn upsert_competency_mapping(&self, mapping: &CompetencyMapping) -> Result<(), AppError>;
}
