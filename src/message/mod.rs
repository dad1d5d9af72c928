// Public API - what other modules can use
pub use handlers::{create_message, list_messages};
pub use visibility::{LimitPolicy, VisibilityFilter};

/// Status text announcing a participant's entry
pub const JOIN_TEXT: &str = "joined";
/// Status text announcing a participant's departure
pub const LEAVE_TEXT: &str = "left";

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
mod types;
mod visibility;
