// src/store/memory.rs

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::{
        answer::{Answer, GradingRecord, GradingScope, ObjectiveScore},
        attempt::{Assessment, Attempt, AttemptScore},
        competency::CompetencyMapping,
        question::{Question, QuestionOption},
    },
    store::ScoringStore,
};

#[derive(Default)]
struct Tables {
    assessments: BTreeMap<i64, Assessment>,
    questions: BTreeMap<i64, Question>,
    options: BTreeMap<i64, QuestionOption>,
    attempts: BTreeMap<i64, Attempt>,
    answers: BTreeMap<i64, Answer>,
    grading_records: BTreeMap<i64, GradingRecord>,
    competency: BTreeMap<i64, CompetencyMapping>,
    failing_answers: BTreeSet<i64>,
    failing_attempt_reads: BTreeSet<i64>,
}

impl Tables {
    fn check_writable(&self, answer_id: i64) -> Result<(), AppError> {
        if self.failing_answers.contains(&answer_id) {
            return Err(AppError::InternalServerError(format!(
                "write to answer {} failed",
                answer_id
            )));
        }
        Ok(())
    }

    fn answer_mut(&mut self, answer_id: i64) -> Result<&mut Answer, AppError> {
        self.answers
            .get_mut(&answer_id)
            .ok_or_else(|| AppError::NotFound(format!("Answer {} not found", answer_id)))
    }
}

/// In-process `ScoringStore` with the same semantics as `PgStore`.
///
/// Every operation holds one lock for its whole duration, so multi-row writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_assessment(&self, assessment: Assessment) {
        self.tables.lock().await.assessments.insert(assessment.id, assessment);
    }

    pub async fn insert_question(&self, question: Question) {
        self.tables.lock().await.questions.insert(question.id, question);
    }

    pub async fn insert_option(&self, option: QuestionOption) {
        self.tables.lock().await.options.insert(option.id, option);
    }

    pub async fn insert_attempt(&self, attempt: Attempt) {
        self.tables.lock().await.attempts.insert(attempt.id, attempt);
    }

    pub async fn insert_answer(&self, answer: Answer) {
        self.tables.lock().await.answers.insert(answer.id, answer);
    }

    pub async fn grading_record(&self, answer_id: i64) -> Option<GradingRecord> {
        self.tables.lock().await.grading_records.get(&answer_id).cloned()
    }

    /// Makes every subsequent write to `answer_id` fail, simulating a store error
    /// on a single row.
    pub async fn fail_writes_for(&self, answer_id: i64) {
        self.tables.lock().await.failing_answers.insert(answer_id);
    }

    /// Makes every subsequent read of `attempt_id`'s answers fail.
    pub async fn fail_reads_for_attempt(&self, attempt_id: i64) {
        self.tables.lock().await.failing_attempt_reads.insert(attempt_id);
    }
}

#[async_trait]
impl ScoringStore for MemoryStore {
    async fn assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        Ok(self.tables.lock().await.assessments.get(&id).cloned())
    }

    async fn attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        Ok(self.tables.lock().await.attempts.get(&id).cloned())
    }

    async fn attempts_for_assessment(&self, assessment_id: i64) -> Result<Vec<Attempt>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .attempts
            .values()
            .filter(|a| a.assessment_id == assessment_id)
            .cloned()
            .collect())
    }

    async fn question(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.tables.lock().await.questions.get(&id).cloned())
    }

    async fn questions_for_assessment(
        &self,
        assessment_id: i64,
    ) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .questions
            .values()
            .filter(|q| q.assessment_id == assessment_id)
            .cloned()
            .collect())
    }

    async fn options_for_question(
        &self,
        question_id: i64,
    ) -> Result<Vec<QuestionOption>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .options
            .values()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn answer(&self, id: i64) -> Result<Option<Answer>, AppError> {
        Ok(self.tables.lock().await.answers.get(&id).cloned())
    }

    async fn answers_for_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>, AppError> {
        let tables = self.tables.lock().await;
        if tables.failing_attempt_reads.contains(&attempt_id) {
            return Err(AppError::InternalServerError(format!(
                "read of attempt {} answers failed",
                attempt_id
            )));
        }
        Ok(tables
            .answers
            .values()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn unscored_answers(&self, scope: GradingScope) -> Result<Vec<Answer>, AppError> {
        let tables = self.tables.lock().await;
        let in_scope = |answer: &Answer| match scope {
            GradingScope::Attempt(attempt_id) => answer.attempt_id == attempt_id,
            GradingScope::Assessment(assessment_id) => tables
                .attempts
                .get(&answer.attempt_id)
                .is_some_and(|t| t.assessment_id == assessment_id),
        };

        Ok(tables
            .answers
            .values()
            .filter(|a| a.points_awarded.is_none() && in_scope(a))
            .cloned()
            .collect())
    }

    async fn scored_answers_without_grader(
        &self,
        assessment_id: Option<i64>,
    ) -> Result<Vec<Answer>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .answers
            .values()
            .filter(|a| a.points_awarded.is_some())
            .filter(|a| a.graded_by.is_none() && !tables.grading_records.contains_key(&a.id))
            .filter(|a| match assessment_id {
                Some(assessment_id) => tables
                    .attempts
                    .get(&a.attempt_id)
                    .is_some_and(|t| t.assessment_id == assessment_id),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn record_objective_score(
        &self,
        answer_id: i64,
        score: &ObjectiveScore,
        scored_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.check_writable(answer_id)?;

        let answer = tables.answer_mut(answer_id)?;
        answer.points_awarded = Some(score.points_awarded);
        answer.is_correct = score.is_correct;
        answer.scored_at = Some(scored_at);
        Ok(())
    }

    async fn record_manual_grade(&self, record: &GradingRecord) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.check_writable(record.answer_id)?;

        let answer = tables.answer_mut(record.answer_id)?;
        answer.points_awarded = Some(record.points);
        answer.is_correct = record.is_correct;
        answer.scored_at = Some(record.graded_at);
        answer.graded_by = Some(record.grader_id);

        tables.grading_records.insert(record.answer_id, record.clone());
        Ok(())
    }

    async fn clear_answer_score(&self, answer_id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.check_writable(answer_id)?;

        let answer = tables.answer_mut(answer_id)?;
        answer.points_awarded = None;
        answer.is_correct = None;
        answer.scored_at = None;
        answer.graded_by = None;
        Ok(())
    }

    async fn save_attempt_score(&self, score: &AttemptScore) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let attempt = tables.attempts.get_mut(&score.attempt_id).ok_or_else(|| {
            AppError::NotFound(format!("Attempt {} not found", score.attempt_id))
        })?;

        attempt.score = Some(score.total_awarded);
        attempt.percentage = Some(score.percentage);
        attempt.passed = Some(score.passed);
        Ok(())
    }

    async fn mark_attempt_completed(
        &self,
        attempt_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if let Some(attempt) = tables.attempts.get_mut(&attempt_id) {
            attempt.completed_at.get_or_insert(completed_at);
        }
        Ok(())
    }

    async fn competency_mappings(
        &self,
        assessment_id: i64,
    ) -> Result<Vec<CompetencyMapping>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .competency
            .values()
            .filter(|m| {
                tables
                    .questions
                    .get(&m.question_id)
                    .is_some_and(|q| q.assessment_id == assessment_id)
            })
            .cloned()
            .collect())
    }

    async fn upsert_competency_mapping(&self, mapping: &CompetencyMapping) -> Result<(), AppError> {
        self.tables
            .lock()
            .await
            .competency
            .insert(mapping.question_id, mapping.clone());
        Ok(())
    }
}
