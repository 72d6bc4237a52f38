// src/scoring/competency.rs

//! Competency areas for reporting rollups. Nothing here affects scores.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::{
    error::AppError,
    models::{
        competency::{CompetencyMapping, QuestionCompetency},
        question::{Question, QuestionType},
    },
    store::ScoringStore,
};

pub const GENERAL_AREA: &str = "General";

/// Keyword rules over question content, checked in order.
static CONTENT_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(ethic\w*|integrity|honest\w*|confidential\w*|complian\w*)", "Ethics & Integrity"),
        (r"(?i)\b(customer\w*|client\w*|complain\w*|patient\w*)", "Customer Focus"),
        (r"(?i)\b(lead\w*|delegat\w*|mentor\w*|motivat\w*)", "Leadership"),
        (r"(?i)\b(team\w*|colleague\w*|collaborat\w*|conflict\w*)", "Teamwork"),
        (r"(?i)\b(email\w*|writ\w*|present\w*|explain\w*|communicat\w*)", "Communication"),
        (r"(?i)\b(problem\w*|troubleshoot\w*|prioriti\w*|decid\w*|decision\w*)", "Problem Solving"),
    ]
    .into_iter()
    .filter_map(|(pattern, area)| match Regex::new(pattern) {
        Ok(re) => Some((re, area)),
        Err(e) => {
            tracing::error!("Invalid competency rule {:?}: {}", pattern, e);
            None
        }
    })
    .collect()
});

fn area_for_type(question_type: &QuestionType) -> &'static str {
    match question_type {
        QuestionType::EmailResponse
        | QuestionType::VideoResponse
        | QuestionType::TimedVideoResponse
        | QuestionType::Essay => "Communication",
        QuestionType::EthicalChoice => "Ethics & Integrity",
        QuestionType::ScenarioChoice | QuestionType::ScenarioResponse => "Problem Solving",
        QuestionType::LikertScale | QuestionType::ForcedChoice => "Work Style",
        QuestionType::MultipleChoice | QuestionType::Unknown(_) => GENERAL_AREA,
    }
}

/// Deterministic default: content keywords first, then the question type.
pub fn default_competency_area(question: &Question) -> &'static str {
    CONTENT_RULES
        .iter()
        .find(|(re, _)| re.is_match(&question.content))
        .map(|(_, area)| *area)
        .unwrap_or_else(|| area_for_type(&question.question_type))
}

/// The admin override when one exists, otherwise the default heuristic.
pub fn get_competency_area(question: &Question, mapping: Option<&CompetencyMapping>) -> String {
    match mapping {
        Some(m) if m.is_custom => m.area.clone(),
        _ => default_competency_area(question).to_string(),
    }
}

/// Effective area for every question of an assessment.
pub async fn get_question_competency_mapping(
    store: &dyn ScoringStore,
    assessment_id: i64,
) -> Result<Vec<QuestionCompetency>, AppError> {
    let questions = store.questions_for_assessment(assessment_id).await?;
    let mappings: HashMap<i64, CompetencyMapping> = store
        .competency_mappings(assessment_id)
        .await?
        .into_iter()
        .map(|m| (m.question_id, m))
        .collect();

    Ok(questions
        .into_iter()
        .map(|question| {
            let mapping = mappings.get(&question.id).filter(|m| m.is_custom);
            QuestionCompetency {
                question_id: question.id,
                area: get_competency_area(&question, mapping),
                is_custom: mapping.is_some(),
                mapped_by: mapping.and_then(|m| m.mapped_by),
                question_type: question.question_type,
            }
        })
        .collect())
}

/// Stores an admin override for one question.
pub async fn save_question_competency_mapping(
    store: &dyn ScoringStore,
    question_id: i64,
    area: &str,
    mapped_by: i64,
) -> Result<CompetencyMapping, AppError> {
    let area = area.trim();
    if area.is_empty() || area.chars().count() > 100 {
        return Err(AppError::BadRequest(
            "Area must be between 1 and 100 characters.".to_string(),
        ));
    }

    store
        .question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question {} not found", question_id)))?;

    let mapping = CompetencyMapping {
        question_id,
        area: area.to_string(),
        is_custom: true,
        mapped_by: Some(mapped_by),
        updated_at: Utc::now(),
    };
    store.upsert_competency_mapping(&mapping).await?;

    tracing::info!(
        "Question {} mapped to competency '{}' by {}",
        question_id,
        mapping.area,
        mapped_by
    );

    Ok(mapping)
}
