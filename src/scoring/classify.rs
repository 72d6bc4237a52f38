// src/scoring/classify.rs

use serde::Serialize;

use crate::models::question::QuestionType;

/// Which path scores a question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringCategory {
    Auto,
    Manual,
}

/// The only place question types are sorted into scoring paths.
///
/// Unknown types need a human grader; they are never auto-awarded.
pub fn classify(question_type: &QuestionType) -> ScoringCategory {
    match question_type {
        QuestionType::MultipleChoice
        | QuestionType::LikertScale
        | QuestionType::ForcedChoice
        | QuestionType::EthicalChoice
        | QuestionType::ScenarioChoice => ScoringCategory::Auto,
        QuestionType::Essay
        | QuestionType::EmailResponse
        | QuestionType::VideoResponse
        | QuestionType::TimedVideoResponse
        | QuestionType::ScenarioResponse
        | QuestionType::Unknown(_) => ScoringCategory::Manual,
    }
}
