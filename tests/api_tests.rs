// HTTP surface tests for Match Broker

use actix_web::{http::StatusCode, test, web, App};
use jsonwebtoken::{encode, EncodingKey, Header};
use match_broker::core::SearchLimits;
use match_broker::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use match_broker::services::{Claims, InMemoryStore, TokenVerifier};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const SECRET: &str = "api-test-secret";

fn bearer(broker: Uuid, role: Option<&str>) -> (&'static str, String) {
    let claims = Claims {
        sub: broker.to_string(),
        role: role.map(str::to_string),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        iss: None,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

fn app_state() -> AppState {
    let store = Arc::new(InMemoryStore::new());
    AppState::new(
        store.clone(),
        store,
        SearchLimits::default(),
        TokenVerifier::new(SECRET, None, 0),
    )
}

fn profile_body(name: &str, dob: &str) -> Value {
    json!({
        "fullName": name,
        "dateOfBirth": dob,
        "gender": "MALE",
        "maritalStatus": "NEVER_MARRIED",
        "heightCm": 178,
        "religion": "Christian",
        "caste": "Syrian",
        "motherTongue": "Malayalam",
        "country": "India",
        "state": "Kerala",
        "city": "Kottayam",
        "education": "MBBS",
        "occupation": "Doctor",
        "annualIncome": 2400000
    })
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_is_public() {
    let app = init_app!(app_state());

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_profiles_require_a_valid_token() {
    let app = init_app!(app_state());

    let req = test::TestRequest::get().uri("/api/v1/profiles").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/profiles")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthenticated");
    assert_eq!(body["statusCode"], 401);
}

#[actix_web::test]
async fn test_profile_lifecycle_over_http() {
    let app = init_app!(app_state());
    let broker1 = Uuid::new_v4();
    let broker2 = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/v1/profiles")
        .insert_header(bearer(broker1, None))
        .set_json(profile_body("Joseph", "1993-04-12"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["isActive"], true);
    assert_eq!(created["ownerId"], broker1.to_string());

    // another broker may not read it
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/profiles/{}", id))
        .insert_header(bearer(broker2, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/profiles/{}", id))
        .insert_header(bearer(broker1, None))
        .set_json(json!({"city": "Kochi"}))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["city"], "Kochi");
    assert_eq!(updated["religion"], "Christian");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/profiles/{}", id))
        .insert_header(bearer(broker1, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/profiles/{}", id))
        .insert_header(bearer(broker1, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_invalid_profile_body_is_bad_request() {
    let app = init_app!(app_state());
    let broker = Uuid::new_v4();

    let mut body = profile_body("Joseph", "1993-04-12");
    body["heightCm"] = json!(10);
    let req = test::TestRequest::post()
        .uri("/api/v1/profiles")
        .insert_header(bearer(broker, None))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/profiles")
        .insert_header(bearer(broker, None))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_search_ignores_malformed_query_values() {
    let app = init_app!(app_state());
    let broker = Uuid::new_v4();

    for name in ["Joseph", "Thomas", "Mathew"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/profiles")
            .insert_header(bearer(broker, None))
            .set_json(profile_body(name, "1993-04-12"))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/profiles/search?gender=robot&minAge=abc&size=2&religion=Christian")
        .insert_header(bearer(Uuid::new_v4(), None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["items"][0]["fullName"], "Joseph");
}

#[actix_web::test]
async fn test_interest_workflow_status_codes() {
    let app = init_app!(app_state());
    let broker1 = Uuid::new_v4();
    let broker2 = Uuid::new_v4();

    let mut ids = Vec::new();
    for (broker, name) in [(broker1, "Joseph"), (broker2, "Anna"), (broker1, "Thomas")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/profiles")
            .insert_header(bearer(broker, None))
            .set_json(profile_body(name, "1994-09-30"))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(created["id"].as_i64().unwrap());
    }
    let (joseph, anna, thomas) = (ids[0], ids[1], ids[2]);

    let send = |sender: i64, receiver: i64, broker: Uuid| {
        test::TestRequest::post()
            .uri("/api/v1/interests")
            .insert_header(bearer(broker, None))
            .set_json(json!({"senderProfileId": sender, "receiverProfileId": receiver}))
            .to_request()
    };

    let resp = test::call_service(&app, send(joseph, anna, broker1)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let interest: Value = test::read_body_json(resp).await;
    let interest_id = interest["id"].as_i64().unwrap();
    assert_eq!(interest["status"], "PENDING");
    assert_eq!(interest["sender"]["fullName"], "Joseph");

    let resp = test::call_service(&app, send(joseph, anna, broker1)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(&app, send(joseph, thomas, broker1)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = test::call_service(&app, send(anna, joseph, broker1)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let respond = |status: &str, broker: Uuid| {
        test::TestRequest::put()
            .uri(&format!("/api/v1/interests/{}/respond", interest_id))
            .insert_header(bearer(broker, None))
            .set_json(json!({ "status": status }))
            .to_request()
    };

    let resp = test::call_service(&app, respond("ACCEPTED", broker1)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, respond("MAYBE", broker2)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, respond("ACCEPTED", broker2)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let accepted: Value = test::read_body_json(resp).await;
    assert_eq!(accepted["status"], "ACCEPTED");

    let resp = test::call_service(&app, respond("REJECTED", broker2)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_state");

    let resp = test::call_service(&app, respond("MAYBE", broker2)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/interests/received/{}", anna))
        .insert_header(bearer(Uuid::new_v4(), Some("ADMIN")))
        .to_request();
    let received: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(received.as_array().unwrap().len(), 1);
}
