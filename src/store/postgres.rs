// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

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

const ANSWER_COLUMNS: &str = "a.id, a.attempt_id, a.question_id, a.selected_option_id, a.rating, \
     a.response_text, a.media_url, a.points_awarded, a.is_correct, a.scored_at, a.graded_by";

const QUESTION_COLUMNS: &str = "id, assessment_id, type, content, points_possible, correct_answer";

const ATTEMPT_COLUMNS: &str = "id, assessment_id, score, percentage, passed, completed_at";

/// `ScoringStore` backed by the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ScoringStore for PgStore {
    async fn assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        let assessment = sqlx::query_as::<_, Assessment>(
            "SELECT id, title, passing_score FROM assessments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assessment)
    }

    async fn attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        let sql = format!("SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = $1");
        let attempt = sqlx::query_as::<_, Attempt>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attempt)
    }

    async fn attempts_for_assessment(&self, assessment_id: i64) -> Result<Vec<Attempt>, AppError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE assessment_id = $1 ORDER BY id"
        );
        let attempts = sqlx::query_as::<_, Attempt>(&sql)
            .bind(assessment_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(attempts)
    }

    async fn question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        let question = sqlx::query_as::<_, Question>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(question)
    }

    async fn questions_for_assessment(
        &self,
        assessment_id: i64,
    ) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE assessment_id = $1 ORDER BY id"
        );
        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(assessment_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(questions)
    }

    async fn options_for_question(
        &self,
        question_id: i64,
    ) -> Result<Vec<QuestionOption>, AppError> {
        let options = sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT id, question_id, label, is_correct, points
            FROM question_options
            WHERE question_id = $1
            ORDER BY id
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    async fn answer(&self, id: i64) -> Result<Option<Answer>, AppError> {
        let sql = format!("SELECT {ANSWER_COLUMNS} FROM answers a WHERE a.id = $1");
        let answer = sqlx::query_as::<_, Answer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(answer)
    }

    async fn answers_for_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>, AppError> {
        let sql = format!(
            "SELECT {ANSWER_COLUMNS} FROM answers a WHERE a.attempt_id = $1 ORDER BY a.id"
        );
        let answers = sqlx::query_as::<_, Answer>(&sql)
            .bind(attempt_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(answers)
    }

    async fn unscored_answers(&self, scope: GradingScope) -> Result<Vec<Answer>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(ANSWER_COLUMNS);
        builder.push(" FROM answers a");

        match scope {
            GradingScope::Attempt(attempt_id) => {
                builder.push(" WHERE a.attempt_id = ");
                builder.push_bind(attempt_id);
            }
            GradingScope::Assessment(assessment_id) => {
                builder.push(" JOIN attempts t ON t.id = a.attempt_id WHERE t.assessment_id = ");
                builder.push_bind(assessment_id);
            }
        }
        builder.push(" AND a.points_awarded IS NULL ORDER BY a.id");

        let answers = builder
            .build_query_as::<Answer>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch unscored answers for {:?}: {:?}", scope, e);
                AppError::from(e)
            })?;

        Ok(answers)
    }

    async fn scored_answers_without_grader(
        &self,
        assessment_id: Option<i64>,
    ) -> Result<Vec<Answer>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(ANSWER_COLUMNS);
        builder.push(
            " FROM answers a
              JOIN attempts t ON t.id = a.attempt_id
              WHERE a.points_awarded IS NOT NULL
                AND a.graded_by IS NULL
                AND NOT EXISTS (SELECT 1 FROM grading_records g WHERE g.answer_id = a.id)",
        );

        if let Some(assessment_id) = assessment_id {
            builder.push(" AND t.assessment_id = ");
            builder.push_bind(assessment_id);
        }
        builder.push(" ORDER BY a.id");

        let answers = builder
            .build_query_as::<Answer>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch scored answers without a grader: {:?}", e);
                AppError::from(e)
            })?;

        Ok(answers)
    }

    async fn record_objective_score(
        &self,
        answer_id: i64,
        score: &ObjectiveScore,
        scored_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE answers SET points_awarded = $1, is_correct = $2, scored_at = $3 WHERE id = $4",
        )
        .bind(score.points_awarded)
        .bind(score.is_correct)
        .bind(scored_at)
        .bind(answer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Answer {} not found", answer_id)));
        }

        Ok(())
    }

    async fn record_manual_grade(&self, record: &GradingRecord) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE answers
            SET points_awarded = $1, is_correct = $2, scored_at = $3, graded_by = $4
            WHERE id = $5
            "#,
        )
        .bind(record.points)
        .bind(record.is_correct)
        .bind(record.graded_at)
        .bind(record.grader_id)
        .bind(record.answer_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Answer {} not found",
                record.answer_id
            )));
        }

        // Last write wins when two graders submit the same answer.
        sqlx::query(
            r#"
            INSERT INTO grading_records (answer_id, grader_id, points, is_correct, rubric, graded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (answer_id) DO UPDATE SET
                grader_id = EXCLUDED.grader_id,
                points = EXCLUDED.points,
                is_correct = EXCLUDED.is_correct,
                rubric = EXCLUDED.rubric,
                graded_at = EXCLUDED.graded_at
            "#,
        )
        .bind(record.answer_id)
        .bind(record.grader_id)
        .bind(record.points)
        .bind(record.is_correct)
        .bind(record.rubric.clone())
        .bind(record.graded_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write grading record for answer {}: {:?}", record.answer_id, e);
            AppError::from(e)
        })?;

        tx.commit().await?;

        Ok(())
    }

    async fn clear_answer_score(&self, answer_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE answers
            SET points_awarded = NULL, is_correct = NULL, scored_at = NULL, graded_by = NULL
            WHERE id = $1
            "#,
        )
        .bind(answer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Answer {} not found", answer_id)));
        }

        Ok(())
    }

    async fn save_attempt_score(&self, score: &AttemptScore) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE attempts SET score = $1, percentage = $2, passed = $3 WHERE id = $4",
        )
        .bind(score.total_awarded)
        .bind(score.percentage)
        .bind(score.passed)
        .bind(score.attempt_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Attempt {} not found",
                score.attempt_id
            )));
        }

        Ok(())
    }

    async fn mark_attempt_completed(
        &self,
        attempt_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE attempts SET completed_at = COALESCE(completed_at, $1) WHERE id = $2")
            .bind(completed_at)
            .bind(attempt_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn competency_mappings(
        &self,
        assessment_id: i64,
    ) -> Result<Vec<CompetencyMapping>, AppError> {
        let mappings = sqlx::query_as::<_, CompetencyMapping>(
            r#"
            SELECT m.question_id, m.area, m.is_custom, m.mapped_by, m.updated_at
            FROM competency_mappings m
            JOIN questions q ON q.id = m.question_id
            WHERE q.assessment_id = $1
            ORDER BY m.question_id
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(mappings)
    }

    async fn upsert_competency_mapping(&self, mapping: &CompetencyMapping) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO competency_mappings (question_id, area, is_custom, mapped_by, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (question_id) DO UPDATE SET
                area = EXCLUDED.area,
                is_custom = EXCLUDED.is_custom,
                mapped_by = EXCLUDED.mapped_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(mapping.question_id)
        .bind(&mapping.area)
        .bind(mapping.is_custom)
        .bind(mapping.mapped_by)
        .bind(mapping.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save competency mapping: {:?}", e);
            AppError::from(e)
        })?;

        Ok(())
    }
}
