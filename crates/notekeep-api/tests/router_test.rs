//! HTTP routing tests: status codes, the response envelope and bearer auth.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`
//! against an in-memory store; no network or database is needed.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use notekeep_api::auth::{Claims, JwtVerifier};
use notekeep_api::config::ServerConfig;
use notekeep_api::state::AppState;
use notekeep_core::ObjectId;
use notekeep_db::MemoryStore;

const SECRET: &str = "router-test-secret";
// 2100-01-01
const FAR_FUTURE: usize = 4_102_444_800;

fn test_router() -> Router {
    let state = AppState::with_memory_store(MemoryStore::new(), JwtVerifier::new(SECRET));
    notekeep_api::router(state)
}

fn token_for(user: ObjectId) -> String {
    let claims = Claims {
        id: user.to_hex(),
        exp: FAR_FUTURE,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<ObjectId>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_router();
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "OK", "message": "Server is running"}));
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let app = test_router();
    let (status, body) = send(&app, Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Route not found"}));
}

#[tokio::test]
async fn test_missing_or_bad_token_is_401() {
    let app = test_router();
    let (status, body) = send(&app, Method::GET, "/api/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authorized to access this route");

    let request = Request::builder()
        .uri("/api/labels")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_ids_are_400() {
    let app = test_router();
    let user = Some(ObjectId::new());

    let (status, body) = send(&app, Method::GET, "/api/notes/123", user, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid note ID");

    let (status, body) = send(&app, Method::DELETE, "/api/labels/xyz", user, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid label ID");

    let (status, body) = send(&app, Method::GET, "/api/notes?labels=bogus", user, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid label ID format");
}

#[tokio::test]
async fn test_note_lifecycle() {
    let app = test_router();
    let user = Some(ObjectId::new());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/notes",
        user,
        Some(json!({"title": "Groceries", "description": "milk, eggs"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Groceries");
    assert_eq!(body["data"]["color"], "#ffffff");
    assert_eq!(body["data"]["order"], 0);
    assert_eq!(body["data"]["isPinned"], false);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/notes", user, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], id.as_str());

    let (status, body) = send(&app, Method::PUT, &format!("/api/notes/{}/pin", id), user, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isPinned"], true);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/notes/{}", id),
        user,
        Some(json!({"description": "milk, eggs, bread"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "milk, eggs, bread");

    let (status, body) = send(&app, Method::DELETE, &format!("/api/notes/{}", id), user, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": {}}));

    let (status, body) = send(&app, Method::GET, &format!("/api/notes/{}", id), user, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Note not found");
}

#[tokio::test]
async fn test_foreign_note_is_401() {
    let app = test_router();
    let owner = Some(ObjectId::new());
    let other = Some(ObjectId::new());

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/notes",
        owner,
        Some(json!({"title": "mine", "description": "private"})),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/api/notes/{}", id), other, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    let app = test_router();
    let user = Some(ObjectId::new());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/notes",
        user,
        Some(json!({"title": "   ", "description": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title is required");

    let (status, body) = send(&app, Method::GET, "/api/notes?isPinned=maybe", user, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "isPinned must be true or false");

    let (status, _) = send(&app, Method::POST, "/api/notes", user, Some(json!({"title": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_label_is_400() {
    let app = test_router();
    let user = Some(ObjectId::new());

    let (status, body) = send(&app, Method::POST, "/api/labels", user, Some(json!({"name": "Work"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["noteCount"], 0);

    let (status, body) = send(&app, Method::POST, "/api/labels", user, Some(json!({"name": "Work"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Label with this name already exists");

    let (status, body) = send(&app, Method::GET, "/api/labels", user, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_label_linkage_routes() {
    let app = test_router();
    let user = Some(ObjectId::new());

    let (_, body) = send(&app, Method::POST, "/api/labels", user, Some(json!({"name": "Work"}))).await;
    let label_id = body["data"]["id"].as_str().unwrap().to_string();
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/notes",
        user,
        Some(json!({"title": "todo", "description": "ship it"})),
    )
    .await;
    let note_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/labels/{}/notes", label_id);

    let (status, body) = send(&app, Method::POST, &uri, user, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide an array of note IDs");

    let (status, body) = send(&app, Method::POST, &uri, user, Some(json!({"noteIds": [note_id]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["modifiedCount"], 1);

    let (_, body) = send(&app, Method::GET, &format!("/api/labels/{}", label_id), user, None).await;
    assert_eq!(body["data"]["noteCount"], 1);
    assert_eq!(body["data"]["label"]["name"], "Work");

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/notes?labels={}", label_id),
        user,
        None,
    )
    .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["labels"][0]["name"], "Work");

    let (status, body) = send(&app, Method::DELETE, &uri, user, Some(json!({"noteIds": [note_id]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["modifiedCount"], 1);
}

#[tokio::test]
async fn test_reorder_route() {
    let app = test_router();
    let user = Some(ObjectId::new());
    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        let (_, body) = send(
            &app,
            Method::POST,
            "/api/notes",
            user,
            Some(json!({"title": title, "description": title})),
        )
        .await;
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/notes/reorder",
        user,
        Some(json!({"noteId": ids[0], "newOrder": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"], 2);

    let (_, body) = send(&app, Method::GET, "/api/notes?sortBy=order", user, None).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["b", "c", "a"]);
}

#[tokio::test]
async fn test_app_sets_request_id() {
    let config = ServerConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::with_memory_store(MemoryStore::new(), JwtVerifier::new(SECRET));
    let app = notekeep_api::app(state, &config);

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
