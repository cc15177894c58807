//! # notekeep-api
//!
//! HTTP surface for notekeep: authenticated note and label routes under
//! `/api`, wrapped in the tracing, request id, CORS and body limit layers.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod services;
pub mod state;
pub mod telemetry;

use std::any::Any;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::SERVER_ERROR_MSG;
use crate::handlers::{health, labels, notes};
use crate::response::Envelope;
use crate::state::AppState;
use crate::telemetry::MakeRequestUuidV7;

/// Routes without middleware. Tests drive this directly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        // Notes
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route("/api/notes/reorder", put(notes::reorder_notes))
        .route(
            "/api/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/api/notes/:id/pin", put(notes::toggle_pin))
        .route("/api/notes/:id/archive", put(notes::toggle_archive))
        // Labels
        .route(
            "/api/labels",
            get(labels::list_labels).post(labels::create_label),
        )
        .route(
            "/api/labels/:id",
            get(labels::get_label)
                .put(labels::update_label)
                .delete(labels::delete_label),
        )
        .route(
            "/api/labels/:id/notes",
            post(labels::add_label_to_notes).delete(labels::remove_label_from_notes),
        )
        .fallback(health::route_not_found)
        .with_state(state)
}

/// The full application: routes plus the middleware stack.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    router(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(config))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(subsystem = "api", error = detail, "Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::failure(SERVER_ERROR_MSG)),
    )
        .into_response()
}
