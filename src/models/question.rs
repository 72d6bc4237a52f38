// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Every question type the platform knows about.
///
/// Tags that do not match a known type are kept verbatim in `Unknown` so they
/// can still be classified (and are never auto-scored).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    MultipleChoice,
    LikertScale,
    ForcedChoice,
    EthicalChoice,
    ScenarioChoice,
    Essay,
    EmailResponse,
    VideoResponse,
    TimedVideoResponse,
    ScenarioResponse,
    Unknown(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::LikertScale => "likert_scale",
            QuestionType::ForcedChoice => "forced_choice",
            QuestionType::EthicalChoice => "ethical_choice",
            QuestionType::ScenarioChoice => "scenario_choice",
            QuestionType::Essay => "essay",
            QuestionType::EmailResponse => "email_response",
            QuestionType::VideoResponse => "video_response",
            QuestionType::TimedVideoResponse => "timed_video_response",
            QuestionType::ScenarioResponse => "scenario_response",
            QuestionType::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for QuestionType {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "multiple_choice" => QuestionType::MultipleChoice,
            "likert_scale" => QuestionType::LikertScale,
            "forced_choice" => QuestionType::ForcedChoice,
            "ethical_choice" => QuestionType::EthicalChoice,
            "scenario_choice" => QuestionType::ScenarioChoice,
            "essay" => QuestionType::Essay,
            "email_response" => QuestionType::EmailResponse,
            "video_response" => QuestionType::VideoResponse,
            "timed_video_response" => QuestionType::TimedVideoResponse,
            "scenario_response" => QuestionType::ScenarioResponse,
            _ => QuestionType::Unknown(tag.to_string()),
        }
    }
}

impl From<String> for QuestionType {
    fn from(tag: String) -> Self {
        QuestionType::from(tag.as_str())
    }
}

impl From<QuestionType> for String {
    fn from(question_type: QuestionType) -> Self {
        question_type.as_str().to_string()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub assessment_id: i64,

    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// The text content of the question.
    pub content: String,

    pub points_possible: f64,

    /// Answer key for keyed questions (e.g. the correct option id).
    pub correct_answer: Option<String>,
}

/// Represents the 'question_options' table.
/// `points` is only configured for choices that award partial credit.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub label: String,
    pub is_correct: bool,
    pub points: Option<f64>,
}
