use serde::Deserialize;
use std::str::FromStr;

use super::models::MessageType;
use crate::shared::AppError;

/// Request payload for posting a message.
/// Fields are optional here so that missing ones are reported together by `validate`.
#[derive(Debug, Deserialize)]
pub struct MessageCreateRequest {
    pub to: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
}

/// A message request that passed schema validation
#[derive(Debug, PartialEq)]
pub struct ValidMessageRequest {
    pub to: String,
    pub text: String,
    pub message_type: MessageType,
}

impl MessageCreateRequest {
    pub fn validate(self) -> Result<ValidMessageRequest, AppError> {
        let mut errors = Vec::new();

        let to = required_text("to", self.to, &mut errors);
        let text = required_text("text", self.text, &mut errors);
        let message_type = match self.message_type.as_deref().map(MessageType::from_str) {
            None => {
                errors.push("\"type\" is required".to_string());
                None
            }
            // Status messages are written by the server only
            Some(Ok(MessageType::Status)) | Some(Err(_)) => {
                errors.push("\"type\" must be one of [message, private_message]".to_string());
                None
            }
            Some(Ok(message_type)) => Some(message_type),
        };

        match (to, text, message_type) {
            (Some(to), Some(text), Some(message_type)) if errors.is_empty() => {
                Ok(ValidMessageRequest {
                    to,
                    text,
                    message_type,
                })
            }
            _ => Err(AppError::Validation(errors)),
        }
    }
}

fn required_text(field: &str, value: Option<String>, errors: &mut Vec<String>) -> Option<String> {
    match value {
        None => {
            errors.push(format!("\"{}\" is required", field));
            None
        }
        Some(value) if value.trim().is_empty() => {
            errors.push(format!("\"{}\" is not allowed to be empty", field));
            None
        }
        Some(value) => Some(value),
    }
}

/// Query string for polling messages. `limit` stays raw so bad values map to 422.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<String>,
}
