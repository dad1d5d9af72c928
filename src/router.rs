use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::message;
use crate::participant;
use crate::shared::AppState;

/// Builds the HTTP surface of the chat server
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "batepapo is running" }))
        .route(
            "/participants",
            post(participant::create_participant).get(participant::list_participants),
        )
        .route(
            "/messages",
            post(message::create_message).get(message::list_messages),
        )
        .route("/status", post(participant::update_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
