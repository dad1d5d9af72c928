use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{models::ParticipantModel, service::ParticipantService, types::ParticipantCreateRequest};
use crate::shared::{identity_from_headers, AppError, AppState};

fn service(state: &AppState) -> ParticipantService {
    ParticipantService::new(
        Arc::clone(&state.participant_repository),
        Arc::clone(&state.message_repository),
    )
}

/// HTTP handler for registering a participant
///
/// POST /participants
/// Returns 201 with no body
#[instrument(name = "create_participant", skip(state, payload))]
pub async fn create_participant(
    State(state): State<AppState>,
    payload: Result<Json<ParticipantCreateRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(request) = payload?;
    info!(name = %request.name, "Registering participant");

    service(&state).register(request).await?;

    Ok(StatusCode::CREATED)
}

/// HTTP handler for listing all participants
///
/// GET /participants
#[instrument(name = "list_participants", skip(state))]
pub async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantModel>>, AppError> {
    let participants = service(&state).list().await?;

    info!(participant_count = participants.len(), "Participants listed");

    Ok(Json(participants))
}

/// HTTP handler for keep-alive pings
///
/// POST /status
/// The `user` header names the participant; absent or unknown both yield 404
#[instrument(name = "update_status", skip(state, headers))]
pub async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let user = identity_from_headers(&headers);

    service(&state).touch(user.as_deref()).await?;

    Ok(StatusCode::OK)
}
