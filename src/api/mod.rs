//! HTTP surface: JSON over axum, permissive CORS.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::presence::PresenceEngine;

/// Header carrying the caller's participant name.
pub const USER_HEADER: &str = "user";

pub fn router(engine: Arc<PresenceEngine>) -> Router {
    Router::new()
        .route(
            "/participants",
            get(handlers::list_participants).post(handlers::join),
        )
        .route(
            "/messages",
            get(handlers::list_messages).post(handlers::post_message),
        )
        .route("/status", post(handlers::heartbeat))
        .with_state(engine)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
