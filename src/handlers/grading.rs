// src/handlers/grading.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        answer::{GradingScope, ManualScoreRequest, RubricGradeRequest},
        question::QuestionType,
    },
    scoring::{
        get_ungraded_responses, grade_with_rubric,
        grading::ManualScore,
        rubric::rubric_for,
        update_manual_score,
    },
    store::SharedStore,
    utils::jwt::Claims,
};

/// Grading queue across every attempt of an assessment.
pub async fn assessment_queue(
    State(store): State<SharedStore>,
    Path(assessment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let pending =
        get_ungraded_responses(store.as_ref(), GradingScope::Assessment(assessment_id)).await?;
    Ok(Json(pending))
}

/// Returns the rubric for a question type.
pub async fn get_rubric(Path(question_type): Path<String>) -> Result<impl IntoResponse, AppError> {
    let question_type = QuestionType::from(question_type.as_str());
    let rubric = rubric_for(&question_type).ok_or_else(|| {
        AppError::NotFound(format!("No rubric available for '{}'", question_type))
    })?;

    Ok(Json(serde_json::json!({
        "question_type": question_type,
        "max_points": rubric.max_points(),
        "criteria": rubric.criteria,
    })))
}

/// Commits a flat score for a manually graded answer.
/// The grader is taken from the token.
pub async fn submit_manual_score(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(answer_id): Path<i64>,
    Json(payload): Json<ManualScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let grader_id = claims.user_id()?;

    let outcome = update_manual_score(
        store.as_ref(),
        answer_id,
        ManualScore {
            points: payload.points,
            is_correct: payload.is_correct,
        },
        grader_id,
    )
    .await?;

    Ok(Json(outcome))
}

/// Grades an answer against its type's rubric.
pub async fn submit_rubric_grade(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(answer_id): Path<i64>,
    Json(payload): Json<RubricGradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let grader_id = claims.user_id()?;

    let outcome =
        grade_with_rubric(store.as_ref(), answer_id, &payload.selections, grader_id).await?;

    Ok(Json(outcome))
}
