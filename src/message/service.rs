use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::MessageModel,
    repository::MessageRepository,
    types::MessageCreateRequest,
    visibility::VisibilityFilter,
};
use crate::config::ChatConfig;
use crate::clock::now_millis;
use crate::participant::repository::ParticipantRepository;
use crate::shared::AppError;

/// Service for posting and polling chat messages
pub struct MessageService {
    repository: Arc<dyn MessageRepository + Send + Sync>,
    participant_repository: Arc<dyn ParticipantRepository + Send + Sync>,
    chat_config: ChatConfig,
}

impl MessageService {
    pub fn new(
        repository: Arc<dyn MessageRepository + Send + Sync>,
        participant_repository: Arc<dyn ParticipantRepository + Send + Sync>,
        chat_config: ChatConfig,
    ) -> Self {
        Self {
            repository,
            participant_repository,
            chat_config,
        }
    }

    /// Posts a message on behalf of a registered participant
    #[instrument(skip(self, request))]
    pub async fn post(
        &self,
        sender: Option<&str>,
        request: MessageCreateRequest,
    ) -> Result<(), AppError> {
        let request = request.validate()?;
        let sender = sender.ok_or_else(|| AppError::invalid("\"user\" header is required"))?;

        if self
            .participant_repository
            .get_participant(sender)
            .await?
            .is_none()
        {
            debug!(sender = %sender, "Rejecting message from unregistered sender");
            return Err(AppError::invalid(format!(
                "Sender is not a registered participant: {}",
                sender
            )));
        }

        let message = MessageModel::new(
            sender.to_string(),
            request.to,
            request.text,
            request.message_type,
        );
        self.repository.append(&message).await?;

        info!(
            from = %message.from,
            to = %message.to,
            message_type = %message.message_type,
            "Message posted"
        );

        if self.chat_config.touch_on_message {
            // The message is already stored; a sender reaped meanwhile only loses the refresh
            if let Err(e) = self
                .participant_repository
                .update_last_status(sender, now_millis())
                .await
            {
                warn!(sender = %sender, error = %e, "Failed to refresh sender activity");
            }
        }

        Ok(())
    }

    /// Lists the messages visible to `viewer`, oldest first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        viewer: Option<String>,
        raw_limit: Option<&str>,
    ) -> Result<Vec<MessageModel>, AppError> {
        let filter =
            VisibilityFilter::from_request(viewer, raw_limit, self.chat_config.limit_policy)?;

        let messages = self.repository.find_visible(&filter).await?;
        debug!(count = messages.len(), "Visible messages retrieved");
        Ok(messages)
    }
}
