use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::models::ParticipantModel;
use crate::shared::AppError;

/// Trait for participant store operations
#[async_trait]
pub trait ParticipantRepository {
    /// Inserts a participant, failing with `Conflict` if the name is taken
    async fn create_participant(&self, participant: &ParticipantModel) -> Result<(), AppError>;
    async fn get_participant(&self, name: &str) -> Result<Option<ParticipantModel>, AppError>;
    async fn list_participants(&self) -> Result<Vec<ParticipantModel>, AppError>;

    /// Sets the activity stamp of an existing participant, failing with `NotFound` otherwise
    async fn update_last_status(&self, name: &str, last_status: i64) -> Result<(), AppError>;

    /// Names of participants whose last activity is older than `cutoff`
    async fn find_inactive(&self, cutoff: i64) -> Result<Vec<String>, AppError>;

    /// Atomically removes the given participants that are still inactive at `cutoff`.
    /// Returns the names actually removed; a participant touched or re-registered
    /// after it was selected keeps its place in the store.
    async fn evict(&self, names: &[String], cutoff: i64) -> Result<Vec<String>, AppError>;
}

/// In-memory implementation of ParticipantRepository for development and testing
pub struct InMemoryParticipantRepository {
    participants: Mutex<HashMap<String, ParticipantModel>>,
}

impl Default for InMemoryParticipantRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryParticipantRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            participants: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated participants
    pub fn with_participants(participants: Vec<ParticipantModel>) -> Self {
        let participant_map = participants
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();

        Self {
            participants: Mutex::new(participant_map),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, ParticipantModel>>, AppError> {
        self.participants.lock().map_err(|_| {
            warn!("Participant store lock poisoned");
            AppError::DatabaseError("Participant store unavailable".to_string())
        })
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryParticipantRepository {
    #[instrument(skip(self, participant))]
    async fn create_participant(&self, participant: &ParticipantModel) -> Result<(), AppError> {
        debug!(name = %participant.name, "Creating participant in memory");

        let mut participants = self.lock()?;
        if participants.contains_key(&participant.name) {
            warn!(name = %participant.name, "Participant already exists in memory");
            return Err(AppError::Conflict(format!(
                "Participant name already taken: {}",
                participant.name
            )));
        }
        participants.insert(participant.name.clone(), participant.clone());

        debug!(name = %participant.name, "Participant created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_participant(&self, name: &str) -> Result<Option<ParticipantModel>, AppError> {
        let participants = self.lock()?;
        Ok(participants.get(name).cloned())
    }

    #[instrument(skip(self))]
    async fn list_participants(&self) -> Result<Vec<ParticipantModel>, AppError> {
        debug!("Listing all participants in memory");

        let participants = self.lock()?;
        Ok(participants.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn update_last_status(&self, name: &str, last_status: i64) -> Result<(), AppError> {
        let mut participants = self.lock()?;
        match participants.get_mut(name) {
            Some(participant) => {
                participant.last_status = last_status;
                debug!(name = %name, last_status, "Participant activity updated in memory");
                Ok(())
            }
            None => {
                debug!(name = %name, "Participant not found for activity update");
                Err(AppError::NotFound(format!("Participant not found: {}", name)))
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_inactive(&self, cutoff: i64) -> Result<Vec<String>, AppError> {
        let participants = self.lock()?;
        let inactive = participants
            .values()
            .filter(|p| p.is_inactive_since(cutoff))
            .map(|p| p.name.clone())
            .collect();
        Ok(inactive)
    }

    #[instrument(skip(self, names), fields(candidates = names.len()))]
    async fn evict(&self, names: &[String], cutoff: i64) -> Result<Vec<String>, AppError> {
        let mut participants = self.lock()?;
        let mut evicted = Vec::with_capacity(names.len());

        for name in names {
            let still_inactive = participants
                .get(name)
                .is_some_and(|p| p.is_inactive_since(cutoff));

            if still_inactive {
                participants.remove(name);
                evicted.push(name.clone());
            } else {
                debug!(name = %name, "Participant active again, skipping eviction");
            }
        }

        debug!(evicted = evicted.len(), "Participants evicted from memory");
        Ok(evicted)
    }
}

/// PostgreSQL implementation of participant repository
pub struct PostgresParticipantRepository {
    pool: PgPool,
}

impl PostgresParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PostgresParticipantRepository {
    #[instrument(skip(self, participant))]
    async fn create_participant(&self, participant: &ParticipantModel) -> Result<(), AppError> {
        debug!(name = %participant.name, "Creating participant in database");

        let result = sqlx::query(
            "INSERT INTO participants (name, last_status) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&participant.name)
        .bind(participant.last_status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create participant in database");
            AppError::from(e)
        })?;

        if result.rows_affected() == 0 {
            warn!(name = %participant.name, "Participant already exists in database");
            return Err(AppError::Conflict(format!(
                "Participant name already taken: {}",
                participant.name
            )));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_participant(&self, name: &str) -> Result<Option<ParticipantModel>, AppError> {
        sqlx::query_as::<_, ParticipantModel>(
            "SELECT name, last_status FROM participants WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, name = %name, "Failed to fetch participant from database");
            AppError::from(e)
        })
    }

    #[instrument(skip(self))]
    async fn list_participants(&self) -> Result<Vec<ParticipantModel>, AppError> {
        sqlx::query_as::<_, ParticipantModel>("SELECT name, last_status FROM participants")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list participants from database");
                AppError::from(e)
            })
    }

    #[instrument(skip(self))]
    async fn update_last_status(&self, name: &str, last_status: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE participants SET last_status = $2 WHERE name = $1")
            .bind(name)
            .bind(last_status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, name = %name, "Failed to update participant activity");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            debug!(name = %name, "Participant not found for activity update");
            return Err(AppError::NotFound(format!("Participant not found: {}", name)));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_inactive(&self, cutoff: i64) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT name FROM participants WHERE last_status < $1")
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to query inactive participants");
                AppError::from(e)
            })?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    #[instrument(skip(self, names), fields(candidates = names.len()))]
    async fn evict(&self, names: &[String], cutoff: i64) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            "DELETE FROM participants WHERE name = ANY($1) AND last_status < $2 RETURNING name",
        )
        .bind(names.to_vec())
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to evict participants from database");
            AppError::from(e)
        })?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }
}
