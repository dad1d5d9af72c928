use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::models::{MessageModel, MessageType, BROADCAST_TARGET};
use super::visibility::{LimitPolicy, VisibilityFilter};
use crate::shared::AppError;

/// Trait for the append-only message log
#[async_trait]
pub trait MessageRepository {
    /// Appends a message at the tail of the log
    async fn append(&self, message: &MessageModel) -> Result<(), AppError>;

    /// Messages matching `filter`, oldest first
    async fn find_visible(&self, filter: &VisibilityFilter)
        -> Result<Vec<MessageModel>, AppError>;
}

/// In-memory implementation of MessageRepository for development and testing
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<MessageModel>>,
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageRepository {
    /// Creates a new empty in-memory log
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of messages in the log
    pub fn message_count(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<MessageModel>>, AppError> {
        self.messages.lock().map_err(|_| {
            warn!("Message log lock poisoned");
            AppError::DatabaseError("Message log unavailable".to_string())
        })
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    #[instrument(skip(self, message), fields(from = %message.from, message_type = %message.message_type))]
    async fn append(&self, message: &MessageModel) -> Result<(), AppError> {
        let mut messages = self.lock()?;
        messages.push(message.clone());

        debug!(log_length = messages.len(), "Message appended in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_visible(
        &self,
        filter: &VisibilityFilter,
    ) -> Result<Vec<MessageModel>, AppError> {
        let messages = self.lock()?;
        let visible = filter.apply(messages.iter());

        debug!(visible = visible.len(), total = messages.len(), "Visible messages selected");
        Ok(visible)
    }
}

/// PostgreSQL implementation of the message log.
/// The serial `id` column carries insertion order.
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    #[instrument(skip(self, message), fields(from = %message.from, message_type = %message.message_type))]
    async fn append(&self, message: &MessageModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO messages (from_name, to_name, text, type, time) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.message_type.to_string())
        .bind(&message.time)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to append message in database");
            AppError::from(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_visible(
        &self,
        filter: &VisibilityFilter,
    ) -> Result<Vec<MessageModel>, AppError> {
        // A NULL viewer makes its comparisons NULL, so only the broadcast and
        // public-type clauses can match for anonymous polls
        let order = match filter.policy() {
            LimitPolicy::Oldest => "ASC",
            LimitPolicy::Newest => "DESC",
        };
        let sql = format!(
            "SELECT from_name, to_name, text, type, time FROM messages \
             WHERE to_name = $1 OR to_name = $2 OR from_name = $2 OR type = $3 \
             ORDER BY id {order} LIMIT $4"
        );
        let limit = filter
            .limit()
            .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));

        let rows = sqlx::query(&sql)
            .bind(BROADCAST_TARGET)
            .bind(filter.viewer())
            .bind(MessageType::Message.to_string())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to query visible messages");
                AppError::from(e)
            })?;

        let mut messages = rows
            .iter()
            .map(|row| {
                let raw_type: String = row.get("type");
                let message_type = MessageType::from_str(&raw_type).map_err(|_| {
                    warn!(message_type = %raw_type, "Unknown message type in database");
                    AppError::DatabaseError(format!("Unknown message type: {}", raw_type))
                })?;

                Ok(MessageModel {
                    from: row.get("from_name"),
                    to: row.get("to_name"),
                    text: row.get("text"),
                    message_type,
                    time: row.get("time"),
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        if filter.policy() == LimitPolicy::Newest {
            messages.reverse();
        }

        Ok(messages)
    }
}
