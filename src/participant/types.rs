use serde::Deserialize;

use crate::shared::AppError;

/// Request payload for registering a participant
#[derive(Debug, Deserialize)]
pub struct ParticipantCreateRequest {
    pub name: String,
}

impl ParticipantCreateRequest {
    /// Returns the name to store, without outer whitespace. A `user` header
    /// cannot carry it, so a padded name could never be addressed.
    pub fn validate(self) -> Result<String, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::invalid("\"name\" is not allowed to be empty"));
        }
        Ok(name.to_string())
    }
}
