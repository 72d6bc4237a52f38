// src/models/competency.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::QuestionType;

/// Represents the 'competency_mappings' table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CompetencyMapping {
    pub question_id: i64,
    pub area: String,
    /// `true` for admin overrides.
    pub is_custom: bool,
    pub mapped_by: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Effective competency area of one question, as listed for an assessment.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionCompetency {
    pub question_id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub area: String,
    pub is_custom: bool,
    pub mapped_by: Option<i64>,
}

/// DTO for overriding a question's competency area.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveCompetencyRequest {
    #[validate(length(min = 1, max = 100, message = "Area must be between 1 and 100 characters."))]
    pub area: String,
}
