// HTTP API tests for Spark Match

use actix_web::{http::StatusCode, test, web, App};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use spark_match::auth::{Claims, JwtVerifier};
use spark_match::config::MatchingSettings;
use spark_match::core::{CandidateFilter, MatchEngine};
use spark_match::models::UserProfile;
use spark_match::routes::{configure_routes, AppState};
use spark_match::services::{DecisionStore, MatchStore, MemoryStore, ProfileStore};
use std::collections::BTreeSet;
use std::sync::Arc;

const SECRET: &str = "test-secret";

fn create_test_profile(id: i64, age: u8, gender: &str, looking_for: &str) -> UserProfile {
    UserProfile {
        id,
        name: format!("User {}", id),
        age,
        gender: gender.to_string(),
        looking_for: looking_for.to_string(),
        location: None,
        is_active: true,
        is_online: false,
        last_seen: None,
        last_active: None,
        bio: None,
        interests: BTreeSet::from(["hiking".to_string()]),
    }
}

fn token_for(user_id: i64) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn bearer(user_id: i64) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user_id)))
}

fn app_state() -> AppState {
    let store = Arc::new(MemoryStore::with_profiles(vec![
        create_test_profile(1, 30, "female", "male"),
        create_test_profile(2, 31, "male", "female"),
        create_test_profile(3, 29, "male", "female"),
    ]));

    AppState {
        engine: MatchEngine::new(
            store.clone() as Arc<dyn ProfileStore>,
            store.clone() as Arc<dyn DecisionStore>,
            store as Arc<dyn MatchStore>,
            CandidateFilter::default(),
        ),
        verifier: JwtVerifier::new(SECRET),
        matching: MatchingSettings::default(),
        postgres: None,
    }
}

#[actix_web::test]
async fn test_api_health() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_api_requires_bearer_token() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/like/2").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/like/2")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_api_like_flow() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/like/2")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matched"], false);
    assert!(body.get("matchId").is_none());

    let req = test::TestRequest::post()
        .uri("/api/v1/like/1")
        .insert_header(bearer(2))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matched"], true);
    let match_id = body["matchId"].as_str().expect("matchId").to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/matches")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["matches"][0]["id"], match_id.as_str());
    assert_eq!(body["matches"][0]["userA"], 1);
    assert_eq!(body["matches"][0]["userB"], 2);
}

#[actix_web::test]
async fn test_api_rejected_actions() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/like/1")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/pass/404")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[actix_web::test]
async fn test_api_potential_matches() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/pass/3")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ok"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/potential-matches?limit=10")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["count"], 1);
    assert_eq!(body["candidates"][0]["id"], 2);
    assert_eq!(body["candidates"][0]["sharedInterests"][0], "hiking");

    let req = test::TestRequest::get()
        .uri("/api/v1/potential-matches?limit=0")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_api_location_update() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/location")
        .insert_header(bearer(1))
        .set_json(serde_json::json!({ "latitude": 40.7128, "longitude": -74.0060 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/location")
        .insert_header(bearer(1))
        .set_json(serde_json::json!({ "latitude": 40.7128 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/location")
        .insert_header(bearer(1))
        .set_json(serde_json::json!({ "latitude": 123.0, "longitude": 0.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
