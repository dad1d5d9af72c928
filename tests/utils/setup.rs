use axum::Router;
use std::sync::Arc;

use batepapo::{
    build_router,
    message::repository::MessageRepository,
    participant::repository::ParticipantRepository,
    AppState, ChatConfig, Repositories,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub participants: Arc<dyn ParticipantRepository + Send + Sync>,
    pub messages: Arc<dyn MessageRepository + Send + Sync>,
}

pub struct TestSetupBuilder {
    participants: Vec<String>,
    chat_config: ChatConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            participants: vec![],
            chat_config: ChatConfig::default(),
        }
    }

    pub fn with_participants(mut self, names: Vec<&str>) -> Self {
        self.participants = names.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_chat_config(mut self, chat_config: ChatConfig) -> Self {
        self.chat_config = chat_config;
        self
    }

    pub async fn build(self) -> TestSetup {
        let repositories = Repositories::in_memory();
        let state = AppState::new(
            repositories.participants.clone(),
            repositories.messages.clone(),
            self.chat_config,
        );

        let setup = TestSetup {
            app: build_router(state),
            participants: repositories.participants,
            messages: repositories.messages,
        };

        // Register through the HTTP surface so join notices are logged too
        for name in &self.participants {
            setup.register(name).await;
        }

        setup
    }
}
