// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Represents the 'answers' table in the database.
///
/// `points_awarded == None` means "not graded yet", never zero.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,

    /// Raw response payload. Which column is populated depends on the question type.
    pub selected_option_id: Option<i64>,
    pub rating: Option<i32>,
    pub response_text: Option<String>,
    pub media_url: Option<String>,

    pub points_awarded: Option<f64>,
    /// `None` for response types without a notion of correctness.
    pub is_correct: Option<bool>,
    pub scored_at: Option<DateTime<Utc>>,
    pub graded_by: Option<i64>,
}

impl Answer {
    pub fn is_scored(&self) -> bool {
        self.points_awarded.is_some()
    }
}

/// Result of scoring one answer through the automatic path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectiveScore {
    pub points_awarded: f64,
    pub is_correct: Option<bool>,
}

/// Where to look for answers awaiting a human grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum GradingScope {
    Attempt(i64),
    Assessment(i64),
}

/// One criterion of a rubric-based grade, as persisted on the grading record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionGrade {
    pub criterion: String,
    pub points: u32,
    pub note: Option<String>,
}

/// Represents the 'grading_records' table.
/// Its presence marks an answer's score as coming from a human grader.
#[derive(Debug, Clone, Serialize)]
pub struct GradingRecord {
    pub answer_id: i64,
    pub grader_id: i64,
    pub points: f64,
    pub is_correct: Option<bool>,
    pub rubric: Option<Json<Vec<CriterionGrade>>>,
    pub graded_at: DateTime<Utc>,
}

/// DTO for a flat manual score.
#[derive(Debug, Deserialize, Validate)]
pub struct ManualScoreRequest {
    #[validate(range(min = 0.0, message = "Points cannot be negative."))]
    pub points: f64,
    /// Derived from the points when omitted.
    pub is_correct: Option<bool>,
}

/// DTO for one criterion selection in a rubric grading pass.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CriterionSelection {
    #[validate(length(min = 1, max = 50))]
    pub criterion: String,
    pub points: u32,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// DTO for grading an answer against its type's rubric.
#[derive(Debug, Deserialize, Validate)]
pub struct RubricGradeRequest {
    #[validate(length(min = 1), nested)]
    pub selections: Vec<CriterionSelection>,
}
