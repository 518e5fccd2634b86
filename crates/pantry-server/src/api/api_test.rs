use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use pantry_agent::GeminiClient;
use pantry_core::Catalog;
use pantry_sourcing::{PoolSettings, SourcingPlanner, SupplierPool};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANAGER_KEY: &str = "IamManager";

fn unreachable_routes() -> RouteClient {
    RouteClient::with_base_url(1, "http://127.0.0.1:1/")
        .expect("route client")
        .with_retry(0, 0)
}

fn test_state(analyst: Option<RecipeAnalyst>) -> AppState {
    let session = Session::new(
        SupplierPool::new(Catalog::default(), PoolSettings::default()),
        SourcingPlanner::new("Hub"),
        StdRng::seed_from_u64(7),
        60_000,
    );
    AppState {
        session: Arc::new(session),
        analyst,
        locator: None,
        routes: unreachable_routes(),
    }
}

fn app(state: AppState) -> Router {
    build_app(
        state,
        ManagerAuth::with_key(MANAGER_KEY),
        default_rate_limit_state(),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn beef_plan() -> serde_json::Value {
    serde_json::json!({
        "location": { "lat": 25.03, "lng": 121.56 },
        "ingredients": [
            { "name": "Beef", "quantity": 2.0, "unit": "pack" },
            { "name": "Garlic", "quantity": 1.0, "unit": "unit" }
        ]
    })
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("conflict", StatusCode::CONFLICT),
        ("unprocessable", StatusCode::UNPROCESSABLE_ENTITY),
        ("upstream_unavailable", StatusCode::SERVICE_UNAVAILABLE),
        ("something_else", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_reports_unconfigured_recipes_and_echoes_request_id() {
    let app = app(test_state(None));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-health")
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["recipes"], "unconfigured");
    assert_eq!(json["meta"]["request_id"], "req-health");
}

#[tokio::test]
async fn demand_combines_pending_meal_with_headcount() {
    let app = app(test_state(None));

    let (status, json) = send(
        &app,
        post_json(
            "/api/v1/demand",
            &serde_json::json!({ "message": "beef noodle soup" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["outcome"], "parsed");
    assert_eq!(json["data"]["demand"]["kind"], "needs_headcount");

    let (_, json) = send(
        &app,
        post_json(
            "/api/v1/demand",
            &serde_json::json!({ "message": "for 4 people", "pending_meal": "beef noodle soup" }),
        ),
    )
    .await;
    assert_eq!(json["data"]["demand"]["kind"], "complete");
    assert_eq!(json["data"]["demand"]["meal"], "beef noodle soup");
    assert_eq!(json["data"]["demand"]["headcount"], 4);
}

#[tokio::test]
async fn demand_rejects_malformed_body() {
    let app = app(test_state(None));
    let (status, json) = send(
        &app,
        post_json("/api/v1/demand", &serde_json::json!({ "text": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn analyze_without_gemini_is_unavailable() {
    let app = app(test_state(None));
    let (status, json) = send(
        &app,
        post_json(
            "/api/v1/recipes/analyze",
            &serde_json::json!({ "meal": "curry", "headcount": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "upstream_unavailable");
}

#[tokio::test]
async fn analyze_validates_headcount() {
    let app = app(test_state(None));
    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/recipes/analyze",
            &serde_json::json!({ "meal": "curry", "headcount": 0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_stores_recipe_on_the_order() {
    let server = MockServer::start().await;
    let text = r#"{"recipeName": "Beef Curry", "recipeUrl": "", "instructions": "Simmer.", "ingredients": [{"name": "Beef", "quantity": 2, "unit": "pack"}]}"#;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gemini = GeminiClient::with_base_url("test-key", "gemini-2.5-flash", 5, &server.uri())
        .expect("gemini client");
    let app = app(test_state(Some(RecipeAnalyst::new(gemini))));

    let (status, json) = send(
        &app,
        post_json(
            "/api/v1/recipes/analyze",
            &serde_json::json!({ "meal": "beef curry", "headcount": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "PENDING");
    assert_eq!(json["data"]["meal"], "beef curry");
    assert_eq!(json["data"]["headcount"], 3);
    assert_eq!(json["data"]["recipe"]["recipeName"], "Beef Curry");
}

#[tokio::test]
async fn analyze_reports_unusable_model_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot help with that." }] } }]
        })))
        .mount(&server)
        .await;

    let gemini = GeminiClient::with_base_url("test-key", "gemini-2.5-flash", 5, &server.uri())
        .expect("gemini client");
    let state = test_state(Some(RecipeAnalyst::new(gemini)));
    let session = Arc::clone(&state.session);
    let app = app(state);

    let (status, json) = send(
        &app,
        post_json(
            "/api/v1/recipes/analyze",
            &serde_json::json!({ "meal": "???", "headcount": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "unprocessable");
    assert_eq!(
        session.current_order().status,
        pantry_core::OrderStatus::Pending
    );
}

#[tokio::test]
async fn plan_dispatches_order_and_current_reflects_it() {
    let app = app(test_state(None));

    let (status, json) = send(&app, post_json("/api/v1/orders/plan", &beef_plan())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "PACKAGING");
    let shipments = json["data"]["shipments"].as_array().expect("shipments");
    assert!(!shipments.is_empty());

    let (status, json) = send(&app, get("/api/v1/orders/current")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "PACKAGING");
}

#[tokio::test]
async fn plan_rejects_invalid_input() {
    let app = app(test_state(None));

    let empty = serde_json::json!({
        "location": { "lat": 25.03, "lng": 121.56 },
        "ingredients": []
    });
    let (status, _) = send(&app, post_json("/api/v1/orders/plan", &empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let negative = serde_json::json!({
        "location": { "lat": 25.03, "lng": 121.56 },
        "ingredients": [{ "name": "Beef", "quantity": -1.0, "unit": "pack" }]
    });
    let (status, json) = send(&app, post_json("/api/v1/orders/plan", &negative)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn cancel_then_cancel_again_conflicts() {
    let app = app(test_state(None));
    send(&app, post_json("/api/v1/orders/plan", &beef_plan())).await;

    let cancel = || post_json("/api/v1/orders/cancel", &serde_json::json!({}));
    let (status, json) = send(&app, cancel()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "CANCELLED");

    let (status, json) = send(&app, cancel()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");
}

#[tokio::test]
async fn cancel_message_stops_an_in_flight_order() {
    let app = app(test_state(None));
    send(&app, post_json("/api/v1/orders/plan", &beef_plan())).await;

    let (_, json) = send(
        &app,
        post_json(
            "/api/v1/demand",
            &serde_json::json!({ "message": "Please CANCEL that" }),
        ),
    )
    .await;
    assert_eq!(json["data"]["outcome"], "cancelled");
    assert_eq!(json["data"]["order"]["status"], "CANCELLED");

    // Once idle again, "cancel" is just another message.
    let (_, json) = send(
        &app,
        post_json("/api/v1/demand", &serde_json::json!({ "message": "cancel" })),
    )
    .await;
    assert_eq!(json["data"]["outcome"], "parsed");
}

#[tokio::test]
async fn route_falls_back_to_straight_line() {
    let app = app(test_state(None));
    let (status, json) = send(
        &app,
        get("/api/v1/routes?from_lat=25.0&from_lng=121.5&to_lat=25.1&to_lng=121.6"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let points = json["data"]["points"].as_array().expect("points");
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["lat"], 25.0);
    assert_eq!(points[1]["lng"], 121.6);
}

#[tokio::test]
async fn manager_routes_require_key() {
    let app = app(test_state(None));

    let (status, json) = send(&app, get("/api/v1/manager/suppliers")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/api/v1/manager/suppliers")
            .header(header::AUTHORIZATION, format!("Bearer {MANAGER_KEY}"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], serde_json::json!([]));
}

#[tokio::test]
async fn manager_sees_and_clears_generated_pool() {
    let state = test_state(None);
    let session = Arc::clone(&state.session);
    let app = app(state);
    send(&app, post_json("/api/v1/orders/plan", &beef_plan())).await;

    let authed = |method: &str, uri: &str| {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {MANAGER_KEY}"))
            .body(Body::empty())
            .expect("request")
    };

    let (status, json) = send(
        &app,
        authed("GET", "/api/v1/manager/suppliers?lat=25.03&lng=121.56"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reports = json["data"].as_array().expect("reports");
    assert_eq!(reports.len(), session.pool().active().len());
    assert!(reports.iter().all(|r| r["distance_km"].is_number()));

    let (status, json) = send(&app, authed("DELETE", "/api/v1/manager/suppliers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["cleared"], true);
    assert!(session.pool().active().is_empty());
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let app = build_app(
        test_state(None),
        ManagerAuth::disabled(),
        RateLimitState::new(2, Duration::from_secs(60)),
    );

    for _ in 0..2 {
        let (status, _) = send(&app, get("/api/v1/orders/current")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, json) = send(&app, get("/api/v1/orders/current")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
}
