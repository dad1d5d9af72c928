use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    models::ParticipantModel, repository::ParticipantRepository,
    types::ParticipantCreateRequest,
};
use crate::clock::now_millis;
use crate::message::{models::MessageModel, repository::MessageRepository, JOIN_TEXT};
use crate::shared::AppError;

/// Service for handling participant business logic
pub struct ParticipantService {
    repository: Arc<dyn ParticipantRepository + Send + Sync>,
    message_repository: Arc<dyn MessageRepository + Send + Sync>,
}

impl ParticipantService {
    pub fn new(
        repository: Arc<dyn ParticipantRepository + Send + Sync>,
        message_repository: Arc<dyn MessageRepository + Send + Sync>,
    ) -> Self {
        Self {
            repository,
            message_repository,
        }
    }

    /// Registers a new participant and announces the entry to the room
    #[instrument(skip(self))]
    pub async fn register(&self, request: ParticipantCreateRequest) -> Result<(), AppError> {
        let name = request.validate()?;

        let participant = ParticipantModel::new(name);
        self.repository.create_participant(&participant).await?;
        debug!(name = %participant.name, "Participant stored");

        let joined = MessageModel::status(&participant.name, JOIN_TEXT);
        self.message_repository.append(&joined).await?;

        info!(name = %participant.name, "Participant registered");
        Ok(())
    }

    /// Lists all current participants
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ParticipantModel>, AppError> {
        let participants = self.repository.list_participants().await?;
        debug!(count = participants.len(), "Participants retrieved");
        Ok(participants)
    }

    /// Refreshes the activity stamp of a participant.
    /// An absent identity is reported the same way as an unknown one.
    #[instrument(skip(self))]
    pub async fn touch(&self, name: Option<&str>) -> Result<(), AppError> {
        let name =
            name.ok_or_else(|| AppError::NotFound("Missing user header".to_string()))?;

        self.repository.update_last_status(name, now_millis()).await?;
        debug!(name = %name, "Participant activity refreshed");
        Ok(())
    }
}
