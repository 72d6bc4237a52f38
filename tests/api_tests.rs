// tests/api_tests.rs

use std::sync::Arc;

use assessment_scoring::{
    config::Config,
    models::{
        answer::Answer,
        attempt::{Assessment, Attempt},
        question::{Question, QuestionOption, QuestionType},
    },
    routes,
    state::AppState,
    store::MemoryStore,
    utils::jwt::{ROLE_ADMIN, ROLE_GRADER, sign_jwt},
};
use axum::{body::Body, http::Request};
use tower::ServiceExt;

const SECRET: &str = "test_secret_for_integration_tests";

fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        port: 0,
        batch_concurrency: 2,
    }
}

fn token(id: i64, role: &str) -> String {
    sign_jwt(id, role, SECRET, 600).expect("Failed to sign token")
}

fn answer(id: i64, question_id: i64) -> Answer {
    Answer {
        id,
        attempt_id: 1,
        question_id,
        selected_option_id: None,
        rating: None,
        response_text: None,
        media_url: None,
        points_awarded: None,
        is_correct: None,
        scored_at: None,
        graded_by: None,
    }
}

fn question(id: i64, question_type: QuestionType, content: &str, points_possible: f64) -> Question {
    Question {
        id,
        assessment_id: 1,
        question_type,
        content: content.to_string(),
        points_possible,
        correct_answer: None,
    }
}

/// One attempt with a correct multiple choice answer (2 pts), an out-of-range
/// likert rating (1 pt), an ungraded essay (10 pts) and an unanswered
/// forced choice question (3 pts).
async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_assessment(Assessment {
            id: 1,
            title: "Customer Support Associate".to_string(),
            passing_score: Some(70.0),
        })
        .await;
    store
        .insert_attempt(Attempt {
            id: 1,
            assessment_id: 1,
            score: None,
            percentage: None,
            passed: None,
            completed_at: None,
        })
        .await;

    store
        .insert_question(question(1, QuestionType::MultipleChoice, "What is 12 x 12?", 2.0))
        .await;
    for (id, is_correct) in [(4, false), (5, true)] {
        store
            .insert_option(QuestionOption {
                id,
                question_id: 1,
                label: format!("Option {id}"),
                is_correct,
                points: None,
            })
            .await;
    }
    store
        .insert_question(question(2, QuestionType::LikertScale, "I enjoy routine work.", 1.0))
        .await;
    store
        .insert_question(question(
            3,
            QuestionType::Essay,
            "Describe how you handle an upset customer.",
            10.0,
        ))
        .await;
    store
        .insert_question(question(4, QuestionType::ForcedChoice, "Pick one.", 3.0))
        .await;

    store
        .insert_answer(Answer {
            selected_option_id: Some(5),
            ..answer(1, 1)
        })
        .await;
    store
        .insert_answer(Answer {
            rating: Some(6),
            ..answer(2, 2)
        })
        .await;
    store
        .insert_answer(Answer {
            response_text: Some("I listen first, then restate the problem.".to_string()),
            ..answer(3, 3)
        })
        .await;

    store
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let state = AppState {
        store: Arc::new(seeded_store().await),
        config: test_config(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

#[tokio::test]
async fn unknown_path_is_404() {
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config: test_config(),
    };
    let app = routes::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/random_path_that_does_not_exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/attempts/1/scoring-status", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(&format!("{}/api/attempts/1/scoring-status", address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn candidates_cannot_grade_or_administer() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let candidate = token(7, "candidate");

    let response = client
        .put(&format!("{}/api/answers/3/manual-score", address))
        .bearer_auth(&candidate)
        .json(&serde_json::json!({ "points": 10.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .post(&format!("{}/api/admin/scoring/repair", address))
        .bearer_auth(token(11, ROLE_GRADER))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn full_scoring_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let candidate = token(7, "candidate");
    let grader = token(11, ROLE_GRADER);

    // 1. Candidate completes the attempt: objective questions are scored.
    let completed: serde_json::Value = client
        .post(&format!("{}/api/attempts/1/complete", address))
        .bearer_auth(&candidate)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(completed["score"]["total_awarded"], 2.0);
    assert_eq!(completed["score"]["total_possible"], 13.0);
    assert_eq!(completed["status"]["auto_scored"], 2);
    assert_eq!(completed["status"]["pending_manual"], 1);
    assert_eq!(completed["status"]["auto_scoring_complete"], true);
    assert_eq!(completed["status"]["manual_scoring_complete"], false);
    assert_eq!(completed["status"]["overall_complete"], false);

    // 2. The essay shows up in the grading queue.
    let queue: serde_json::Value = client
        .get(&format!("{}/api/assessments/1/ungraded", address))
        .bearer_auth(&grader)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    let queue = queue.as_array().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["answer"]["id"], 3);
    assert_eq!(queue[0]["rubric_available"], true);

    // 3. Grader looks up the essay rubric and grades 6/10.
    let response = client
        .get(&format!("{}/api/rubrics/essay", address))
        .bearer_auth(&grader)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let rubric: serde_json::Value = response.json().await.unwrap();
    assert_eq!(rubric["max_points"], 10);

    let response = client
        .post(&format!("{}/api/answers/3/rubric-grade", address))
        .bearer_auth(&grader)
        .json(&serde_json::json!({
            "selections": [
                { "criterion": "content", "points": 3, "note": "Good <b>examples</b>" },
                { "criterion": "organization", "points": 2 },
                { "criterion": "language", "points": 1 }
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["points_awarded"], 6.0);
    assert_eq!(outcome["graded_by"], 11);
    assert_eq!(outcome["attempt"]["total_awarded"], 8.0);
    assert_eq!(outcome["attempt"]["total_possible"], 13.0);
    assert_eq!(outcome["attempt"]["passed"], false);
    let percentage = outcome["attempt"]["percentage"].as_f64().unwrap();
    assert!((percentage - 61.538).abs() < 0.01);

    // 4. Everything is scored now.
    let status: serde_json::Value = client
        .get(&format!("{}/api/attempts/1/scoring-status", address))
        .bearer_auth(&candidate)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(status["overall_complete"], true);

    let report: serde_json::Value = client
        .get(&format!("{}/api/attempts/1/report", address))
        .bearer_auth(&candidate)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(report["questions"].as_array().unwrap().len(), 4);
    assert_eq!(report["questions"][3]["state"], "unanswered");
    assert_eq!(report["score"]["total_awarded"], 8.0);
}

#[tokio::test]
async fn manual_score_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let grader = token(11, ROLE_GRADER);

    // Negative points fail request validation.
    let response = client
        .put(&format!("{}/api/answers/3/manual-score", address))
        .bearer_auth(&grader)
        .json(&serde_json::json!({ "points": -1.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    // More than the question is worth.
    let response = client
        .put(&format!("{}/api/answers/3/manual-score", address))
        .bearer_auth(&grader)
        .json(&serde_json::json!({ "points": 11.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    // Objective answers cannot be graded by hand.
    let response = client
        .put(&format!("{}/api/answers/1/manual-score", address))
        .bearer_auth(&grader)
        .json(&serde_json::json!({ "points": 1.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .put(&format!("{}/api/answers/404/manual-score", address))
        .bearer_auth(&grader)
        .json(&serde_json::json!({ "points": 1.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .put(&format!("{}/api/answers/3/manual-score", address))
        .bearer_auth(&grader)
        .json(&serde_json::json!({ "points": 0.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["points_awarded"], 0.0);
    assert_eq!(outcome["is_correct"], false);
}

#[tokio::test]
async fn rubric_lookup_for_objective_type_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/rubrics/multiple_choice", address))
        .bearer_auth(token(11, ROLE_GRADER))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("No rubric available"));
}

#[tokio::test]
async fn admin_competency_override_and_rescore() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = token(1, ROLE_ADMIN);

    let response = client
        .put(&format!("{}/api/admin/questions/3/competency", address))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "area": "Written Communication" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .put(&format!("{}/api/admin/questions/3/competency", address))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "area": "" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    let mappings: serde_json::Value = client
        .get(&format!("{}/api/assessments/1/competencies", address))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    let essay = mappings
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["question_id"] == 3)
        .unwrap();
    assert_eq!(essay["area"], "Written Communication");
    assert_eq!(essay["is_custom"], true);
    assert_eq!(essay["mapped_by"], 1);

    let report: serde_json::Value = client
        .post(&format!("{}/api/admin/assessments/1/rescore", address))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(report["attempts_rescored"].as_array().unwrap().len(), 1);
    assert_eq!(report["attempts_rescored"][0]["total_awarded"], 2.0);
    assert!(report["failures"].as_array().unwrap().is_empty());

    let response = client
        .post(&format!("{}/api/admin/assessments/99/rescore", address))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}
