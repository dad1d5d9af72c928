// Public API - what other modules can use
pub use handlers::{create_participant, list_participants, update_status};
pub use reaper::{start_reaper, sweep_inactive_participants, ReaperConfig, SweepError};

// Internal modules
mod handlers;
pub mod models;
mod reaper;
pub mod repository;
mod service;
mod types;
