// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'assessments' table (only the columns scoring reads).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub title: String,
    /// Percentage needed to pass. Falls back to the policy default when unset.
    pub passing_score: Option<f64>,
}

/// Represents the 'attempts' table: one test-taker's run through an assessment.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub assessment_id: i64,
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub passed: Option<bool>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Aggregate recomputed from an attempt's answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptScore {
    pub attempt_id: i64,
    pub total_awarded: f64,
    pub total_possible: f64,
    pub percentage: f64,
    pub passed: bool,
}
