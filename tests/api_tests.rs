use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use program_match_api::{
    models::{Program, UserPreferences},
    routes::{create_router, AppState},
    services::{
        providers::{MemorySource, UserDataSource},
        RecommendationEngine,
    },
};

const USER: &str = "00000000-0000-0000-0000-0000000003e8";

fn program(id: u128, country: &str, tuition: f64, scholarship: bool) -> Program {
    Program {
        id: Uuid::from_u128(id),
        university: format!("University {}", id),
        name: format!("Program {}", id),
        degree_type: "Master".to_string(),
        country: country.to_string(),
        city: "Capital".to_string(),
        tuition_fee: Some(tuition),
        specialization: "Computer Science, AI".to_string(),
        duration: "2 years".to_string(),
        study_level: "Master".to_string(),
        language_requirements: "English".to_string(),
        scholarship_available: scholarship,
        created_at: Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0).unwrap(),
    }
}

fn create_test_server_with(programs: Vec<Program>) -> (TestServer, Arc<MemorySource>) {
    let source = Arc::new(MemorySource::new(programs));
    let engine = RecommendationEngine::new(source.clone(), source.clone());
    let app = create_router(AppState::new(engine));
    (TestServer::new(app).unwrap(), source)
}

fn create_test_server() -> (TestServer, Arc<MemorySource>) {
    create_test_server_with(vec![
        program(1, "Canada", 8_000_000.0, true),
        program(2, "Canada", 20_000_000.0, false),
        program(3, "Netherlands", 6_000_000.0, false),
        program(4, "Japan", 7_000_000.0, false),
    ])
}

fn exact_preferences() -> Value {
    json!({
        "countries": ["Canada", "Germany"],
        "degree_type": ["Master"],
        "study_level": "master",
        "budget_range": [5000000, 10000000],
        "specialization": ["computer science"],
        "scholarship_needed": true
    })
}

fn program_ids(categories: &[Value]) -> Vec<String> {
    categories
        .iter()
        .flat_map(|c| c["programs"].as_array().unwrap().iter())
        .map(|m| m["program"]["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_recommendations_with_explicit_preferences() {
    let (server, _) = create_test_server();

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "preferences": exact_preferences() }))
        .await;

    response.assert_status_ok();
    let categories: Vec<Value> = response.json();

    assert_eq!(categories[0]["id"], "perfect-match");
    assert_eq!(
        categories[0]["programs"][0]["program"]["id"],
        Uuid::from_u128(1).to_string()
    );
    assert_eq!(categories[0]["programs"][0]["confidence"], "high");
    assert!(categories[0]["matchPercentage"].as_u64().unwrap() >= 90);

    // No program is listed twice
    let ids = program_ids(&categories);
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(ids.len(), unique.len());
}

#[tokio::test]
async fn test_recommendations_without_preferences_fall_back_to_general() {
    let (server, _) = create_test_server();

    let response = server.post("/api/v1/recommendations").json(&json!({})).await;

    response.assert_status_ok();
    let categories: Vec<Value> = response.json();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["id"], "general");
    assert_eq!(categories[0]["programs"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_empty_catalog_returns_empty_list() {
    let (server, _) = create_test_server_with(vec![]);

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "preferences": exact_preferences() }))
        .await;

    response.assert_status_ok();
    let categories: Vec<Value> = response.json();
    assert!(categories.is_empty());
}

#[tokio::test]
async fn test_stored_preferences_used_when_omitted() {
    let (server, source) = create_test_server();
    let preferences: UserPreferences = serde_json::from_value(exact_preferences()).unwrap();
    source
        .set_preferences(USER.parse().unwrap(), preferences)
        .await;

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "user_id": USER }))
        .await;

    response.assert_status_ok();
    let categories: Vec<Value> = response.json();
    assert_eq!(categories[0]["id"], "perfect-match");
}

#[tokio::test]
async fn test_refresh_matches_recommendations() {
    let (server, _) = create_test_server();
    let body = json!({ "preferences": exact_preferences(), "user_id": USER });

    let initial: Vec<Value> = server.post("/api/v1/recommendations").json(&body).await.json();
    let refreshed: Vec<Value> = server
        .post("/api/v1/recommendations/refresh")
        .json(&body)
        .await
        .json();

    assert_eq!(initial, refreshed);
}

#[tokio::test]
async fn test_recorded_interactions_boost_scores() {
    let (server, _) = create_test_server();
    let body = json!({ "preferences": { "countries": ["France"] }, "user_id": USER });

    let before: Vec<Value> = server.post("/api/v1/recommendations").json(&body).await.json();
    assert_eq!(before[0]["programs"][0]["matchScore"], 0);

    for kind in ["viewed", "saved"] {
        server
            .post(&format!("/api/v1/users/{}/interactions", USER))
            .json(&json!({ "kind": kind, "program_id": Uuid::from_u128(4) }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let after: Vec<Value> = server.post("/api/v1/recommendations").json(&body).await.json();
    let top = &after[0]["programs"][0];
    assert_eq!(top["program"]["id"], Uuid::from_u128(4).to_string());
    assert_eq!(top["matchScore"], 10);
}

#[tokio::test]
async fn test_interaction_without_program_rejected() {
    let (server, _) = create_test_server();

    let response = server
        .post(&format!("/api/v1/users/{}/interactions", USER))
        .json(&json!({ "kind": "saved" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("program_id"));
}

#[tokio::test]
async fn test_interaction_with_unknown_program_not_found() {
    let (server, source) = create_test_server();

    let response = server
        .post(&format!("/api/v1/users/{}/interactions", USER))
        .json(&json!({ "kind": "viewed", "program_id": Uuid::from_u128(99) }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let history = source
        .fetch_interactions(USER.parse().unwrap())
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_request_id_echoed() {
    let (server, _) = create_test_server();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-abc"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-abc");

    let response = server.get("/health").await;
    let generated = response.header("x-request-id");
    assert!(Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}
