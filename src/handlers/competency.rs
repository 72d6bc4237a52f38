// src/handlers/competency.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::competency::SaveCompetencyRequest,
    scoring::{get_question_competency_mapping, save_question_competency_mapping},
    store::SharedStore,
    utils::jwt::Claims,
};

/// Effective competency area of every question in an assessment.
pub async fn list_for_assessment(
    State(store): State<SharedStore>,
    Path(assessment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mappings = get_question_competency_mapping(store.as_ref(), assessment_id).await?;
    Ok(Json(mappings))
}

/// Overrides the competency area of a question.
/// Admin only.
pub async fn save_mapping(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
    Json(payload): Json<SaveCompetencyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let admin_id = claims.user_id()?;

    let mapping =
        save_question_competency_mapping(store.as_ref(), question_id, &payload.area, admin_id)
            .await?;

    Ok(Json(mapping))
}
