use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::clock::now_millis;

/// Database model for participants table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantModel {
    pub name: String,     // Case-sensitive, unique across the store
    pub last_status: i64, // Last activity, ms since epoch
}

impl ParticipantModel {
    /// Creates a participant whose last activity is now
    pub fn new(name: String) -> Self {
        Self {
            name,
            last_status: now_millis(),
        }
    }

    /// Whether the last activity happened strictly before `cutoff`
    pub fn is_inactive_since(&self, cutoff: i64) -> bool {
        self.last_status < cutoff
    }
}
