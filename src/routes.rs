// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, attempt, competency, grading},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, grader_middleware},
};

/// Assembles the main application router.
///
/// * Attempt routes are open to any authenticated caller.
/// * Grading routes require a grader or admin token.
/// * Admin routes require an admin token.
/// * Trace and CORS are applied globally.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let attempt_routes = Router::new()
        .route("/{id}/objective-score", post(attempt::score_objective))
        .route("/{id}/score", post(attempt::calculate_score))
        .route("/{id}/complete", post(attempt::complete))
        .route("/{id}/scoring-status", get(attempt::scoring_status))
        .route("/{id}/report", get(attempt::report))
        .merge(
            Router::new()
                .route("/{id}/ungraded", get(attempt::ungraded))
                .layer(middleware::from_fn(grader_middleware)),
        );

    let assessment_routes = Router::new()
        .route("/{id}/competencies", get(competency::list_for_assessment))
        .merge(
            Router::new()
                .route("/{id}/ungraded", get(grading::assessment_queue))
                .layer(middleware::from_fn(grader_middleware)),
        );

    let rubric_routes = Router::new().route("/{question_type}", get(grading::get_rubric));

    let answer_routes = Router::new()
        .route("/{id}/manual-score", put(grading::submit_manual_score))
        .route("/{id}/rubric-grade", post(grading::submit_rubric_grade))
        .layer(middleware::from_fn(grader_middleware));

    let admin_routes = Router::new()
        .route("/questions/{id}/competency", put(competency::save_mapping))
        .route("/scoring/repair", post(admin::repair_scoring))
        .route("/assessments/{id}/rescore", post(admin::rescore))
        .layer(middleware::from_fn(admin_middleware));

    let api = Router::new()
        .nest("/attempts", attempt_routes)
        .nest("/assessments", assessment_routes)
        .nest("/rubrics", rubric_routes)
        .nest("/answers", answer_routes)
        .nest("/admin", admin_routes)
        // Runs before every role check above.
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
