use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::message::repository::{
    InMemoryMessageRepository, MessageRepository, PostgresMessageRepository,
};
use crate::participant::repository::{
    InMemoryParticipantRepository, ParticipantRepository, PostgresParticipantRepository,
};
use crate::shared::AppError;

/// Upper bound on waiting for a pooled connection; storage calls inherit it
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS participants (
        name TEXT PRIMARY KEY,
        last_status BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id BIGSERIAL PRIMARY KEY,
        from_name TEXT NOT NULL,
        to_name TEXT NOT NULL,
        text TEXT NOT NULL,
        type TEXT NOT NULL,
        time TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS participants_last_status_idx ON participants (last_status)",
];

/// Connected storage handles, built once at startup and shared by every component
#[derive(Clone)]
pub struct Repositories {
    pub participants: Arc<dyn ParticipantRepository + Send + Sync>,
    pub messages: Arc<dyn MessageRepository + Send + Sync>,
}

impl Repositories {
    /// Process-local stores; contents are lost on restart
    pub fn in_memory() -> Self {
        Self {
            participants: Arc::new(InMemoryParticipantRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
        }
    }

    /// Stores backed by an already connected PostgreSQL pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            participants: Arc::new(PostgresParticipantRepository::new(pool.clone())),
            messages: Arc::new(PostgresMessageRepository::new(pool)),
        }
    }

    /// Connects to PostgreSQL when a URL is given, otherwise falls back to memory
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: Option<&str>) -> Result<Self, AppError> {
        match database_url {
            None => {
                info!("No DATABASE_URL configured, using in-memory storage");
                Ok(Self::in_memory())
            }
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .connect(url)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Failed to connect to database");
                        AppError::from(e)
                    })?;
                ensure_schema(&pool).await?;

                info!("Connected to PostgreSQL storage");
                Ok(Self::postgres(pool))
            }
        }
    }
}

async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await.map_err(|e| {
            warn!(error = %e, "Failed to apply schema");
            AppError::from(e)
        })?;
    }
    Ok(())
}
