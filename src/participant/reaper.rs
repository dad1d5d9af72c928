use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::repository::ParticipantRepository;
use crate::clock::now_millis;
use crate::message::{models::MessageModel, repository::MessageRepository, LEAVE_TEXT};
use crate::shared::AppError;

/// Configuration for the inactivity reaper
#[derive(Debug, Clone, PartialEq)]
pub struct ReaperConfig {
    /// How often a sweep runs
    pub sweep_interval: Duration,
    /// How long a participant may stay silent before eviction
    pub inactivity_threshold: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(15),
            inactivity_threshold: Duration::from_secs(10),
        }
    }
}

/// Failure of a single sweep. Logged by the reaper loop, never surfaced to clients.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Storage error during sweep: {0}")]
    Storage(#[from] AppError),

    #[error("Failed to announce {failed} of {evicted} departures")]
    Announce { failed: usize, evicted: usize },
}

/// Starts the background reaper that periodically evicts inactive participants.
///
/// The loop stops waiting for ticks once `shutdown` flips to `true` (or its sender
/// is dropped); a sweep already running is allowed to finish first.
#[instrument(skip(participant_repository, message_repository, shutdown))]
pub async fn start_reaper(
    participant_repository: Arc<dyn ParticipantRepository + Send + Sync>,
    message_repository: Arc<dyn MessageRepository + Send + Sync>,
    config: ReaperConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        inactivity_threshold_secs = config.inactivity_threshold.as_secs(),
        "Starting participant reaper background task"
    );

    let mut sweep_interval = interval_at(
        Instant::now() + config.sweep_interval,
        config.sweep_interval,
    );
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Participant reaper stopping");
                    break;
                }
            }
            _ = sweep_interval.tick() => {
                match sweep_inactive_participants(
                    &participant_repository,
                    &message_repository,
                    config.inactivity_threshold,
                )
                .await
                {
                    Ok(evicted) => {
                        debug!(evicted_count = evicted.len(), "Reaper sweep completed");
                    }
                    Err(e) => {
                        error!(error = %e, "Reaper sweep failed");
                    }
                }
            }
        }
    }
}

/// Runs one sweep: evicts participants silent for longer than `inactivity_threshold`
/// and appends a "left" status message for each one removed.
///
/// Returns the names evicted.
#[instrument(skip(participant_repository, message_repository))]
pub async fn sweep_inactive_participants(
    participant_repository: &Arc<dyn ParticipantRepository + Send + Sync>,
    message_repository: &Arc<dyn MessageRepository + Send + Sync>,
    inactivity_threshold: Duration,
) -> Result<Vec<String>, SweepError> {
    let threshold_ms = i64::try_from(inactivity_threshold.as_millis()).unwrap_or(i64::MAX);
    let cutoff = now_millis().saturating_sub(threshold_ms);

    let candidates = participant_repository.find_inactive(cutoff).await?;
    if candidates.is_empty() {
        debug!("No inactive participants to evict");
        return Ok(Vec::new());
    }

    // Anyone touched since the read above is skipped by the store
    let evicted = participant_repository.evict(&candidates, cutoff).await?;
    if evicted.is_empty() {
        return Ok(evicted);
    }

    info!(count = evicted.len(), "Evicted inactive participants");

    let departures = evicted.iter().map(|name| async move {
        let left = MessageModel::status(name, LEAVE_TEXT);
        message_repository
            .append(&left)
            .await
            .map_err(|e| (name, e))
    });

    let failed = join_all(departures)
        .await
        .into_iter()
        .filter_map(Result::err)
        .inspect(|(name, e)| {
            warn!(name = %name, error = %e, "Failed to announce departure");
        })
        .count();

    if failed > 0 {
        return Err(SweepError::Announce {
            failed,
            evicted: evicted.len(),
        });
    }

    Ok(evicted)
}
