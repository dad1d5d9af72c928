// Library crate for the batepapo chat server
// This file exposes the public API for the binary and integration tests

pub mod clock;
pub mod config;
pub mod message;
pub mod participant;
pub mod router;
pub mod shared;
pub mod storage;

// Re-export commonly used types for easier access in tests
pub use config::{ChatConfig, Config};
pub use message::{models::MessageModel, LimitPolicy, VisibilityFilter};
pub use participant::{models::ParticipantModel, ReaperConfig};
pub use router::build_router;
pub use shared::{AppError, AppState};
pub use storage::Repositories;
