//! Integration tests for the Gemini-backed collaborators using wiremock.

use pantry_agent::{AgentError, GeminiClient, LandmarkLocator, RecipeAnalyst};
use pantry_core::Coordinate;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn client(base_url: &str) -> GeminiClient {
    GeminiClient::with_base_url("test-key", "gemini-2.5-flash", 5, base_url)
        .expect("client construction should not fail")
}

fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
}

fn keys() -> Vec<String> {
    vec!["Beef".to_string(), "Garlic".to_string()]
}

#[tokio::test]
async fn recipe_uses_grounding_url_and_search_tool() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": "Sure!\n```json\n{\"recipeName\": \"Taiwanese Beef Noodle Soup\", \"recipeUrl\": \"made-up\", \"instructions\": \"Braise beef. Serve over noodles.\", \"ingredients\": [{\"name\": \"Beef\", \"quantity\": 2, \"unit\": \"pack\"}, {\"name\": \"Garlic\", \"quantity\": 1, \"unit\": \"unit\"}]}\n```" }] },
            "groundingMetadata": {
                "groundingChunks": [{ "web": { "uri": "https://recipes.example/beef-noodle" } }]
            }
        }]
    });

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(serde_json::json!({ "tools": [{ "googleSearch": {} }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let analyst = RecipeAnalyst::new(client(&server.uri()));
    let recipe = analyst
        .try_analyze("beef noodle soup", 4, &keys(), false)
        .await
        .expect("request succeeds")
        .expect("recipe parsed");

    assert_eq!(recipe.recipe_name, "Taiwanese Beef Noodle Soup");
    assert_eq!(recipe.recipe_url, "https://recipes.example/beef-noodle");
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.ingredients[0].name, "Beef");
    assert!((recipe.ingredients[0].quantity - 2.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn recipe_without_grounding_gets_search_url() {
    let server = MockServer::start().await;
    let text = r#"{"recipeName": "Mapo Tofu", "recipeUrl": "https://hallucinated.example", "instructions": "Cook.", "ingredients": []}"#;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(text)))
        .mount(&server)
        .await;

    let analyst = RecipeAnalyst::new(client(&server.uri()));
    let recipe = analyst
        .analyze("mapo tofu", 2, &keys(), false)
        .await
        .expect("recipe parsed");
    assert_eq!(
        recipe.recipe_url,
        "https://www.google.com/search?q=Mapo%20Tofu%20recipe"
    );
}

#[tokio::test]
async fn unparseable_recipe_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response("I could not find that dish.")),
        )
        .mount(&server)
        .await;

    let analyst = RecipeAnalyst::new(client(&server.uri()));
    let result = analyst
        .try_analyze("???", 2, &keys(), true)
        .await
        .expect("request succeeds");
    assert!(result.is_none());
}

#[tokio::test]
async fn server_error_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        // Two calls below, each one attempt plus two retries.
        .expect(6)
        .mount(&server)
        .await;

    let analyst = RecipeAnalyst::new(client(&server.uri()).with_retry(2, 0));
    let err = analyst
        .try_analyze("curry", 2, &keys(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Http(_)));

    // The lenient entry point folds the failure into None.
    assert!(analyst.analyze("curry", 2, &keys(), false).await.is_none());
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let analyst = RecipeAnalyst::new(client(&server.uri()).with_retry(3, 0));
    assert!(analyst
        .try_analyze("curry", 2, &keys(), false)
        .await
        .is_err());
}

#[tokio::test]
async fn landmark_lookup_uses_maps_tool() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(serde_json::json!({ "tools": [{ "googleMaps": {} }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
            r#"The closest one is {"name": "PX Mart Xinyi", "lat": 25.033, "lng": 121.565}."#,
        )))
        .mount(&server)
        .await;

    let locator = LandmarkLocator::new(client(&server.uri()));
    let landmark = locator
        .nearest_supermarket(Coordinate::new(25.03, 121.56), &["PX Mart".to_string()])
        .await
        .expect("landmark found");
    assert_eq!(landmark.name, "PX Mart Xinyi");
    assert_eq!(landmark.location, Coordinate::new(25.033, 121.565));
}

#[tokio::test]
async fn landmark_lookup_failure_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let locator = LandmarkLocator::new(client(&server.uri()));
    assert!(locator
        .nearest_supermarket(Coordinate::new(25.03, 121.56), &[])
        .await
        .is_none());
}

#[tokio::test]
async fn landmark_without_coordinates_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response(r#"{"name": "Somewhere"}"#)),
        )
        .mount(&server)
        .await;

    let locator = LandmarkLocator::new(client(&server.uri()));
    let found = locator
        .try_nearest_supermarket(Coordinate::new(25.03, 121.56), &[])
        .await
        .expect("request succeeds");
    assert!(found.is_none());
}
