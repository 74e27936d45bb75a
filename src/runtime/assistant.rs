use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use super::synthesizer::ResponseSynthesizer;
use super::turn::{TurnReport, TurnRunner};
use crate::app::Config;
use crate::memory::ConversationMemory;
use crate::models::{Message, ModelFactory};
use crate::search::SearchGateway;
use crate::store::SessionStore;
use crate::utils::{log_error, AssistantError};

/// Summary of one session for listings and info queries
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: String,
    pub conversation_name: String,
    pub message_count: usize,
}

/// Top-level facade tying memory, search and synthesis together. This
/// is the surface an API layer (or the CLI) drives; nothing here raises
/// an unhandled condition outward.
pub struct Assistant {
    memory: ConversationMemory,
    gateway: SearchGateway,
    synthesizer: ResponseSynthesizer,
}

impl Assistant {
    /// Wire up the assistant from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let store = Arc::new(SessionStore::open(&config.storage));
        let memory = ConversationMemory::new(store, config.storage.keep_name_on_clear);
        let gateway = SearchGateway::from_config(&config.search)?;
        let model = ModelFactory::create(&config.model)?;
        let synthesizer = ResponseSynthesizer::new(model, config.model.clone());

        Ok(Self {
            memory,
            gateway,
            synthesizer,
        })
    }

    /// Assemble from pre-built parts (tests, alternative providers)
    pub fn from_parts(
        memory: ConversationMemory,
        gateway: SearchGateway,
        synthesizer: ResponseSynthesizer,
    ) -> Self {
        Self {
            memory,
            gateway,
            synthesizer,
        }
    }

    /// Mint a new session id. The document is created on first write.
    pub fn create_session(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Known sessions, most recently modified first
    pub fn list_sessions(&self) -> Vec<String> {
        self.memory.store().list()
    }

    /// Name and message count for one session
    pub fn session_info(&self, session_id: &str) -> SessionInfo {
        let document = self.memory.document(session_id);
        SessionInfo {
            session_id: session_id.to_string(),
            conversation_name: document.display_name(),
            message_count: document.messages.len(),
        }
    }

    /// Ordered message history for a session
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        self.memory.history(session_id)
    }

    /// Process one user turn through the orchestrator
    pub async fn post_turn(&self, session_id: &str, user_message: &str) -> TurnReport {
        let runner = TurnRunner::new(&self.memory, &self.gateway, &self.synthesizer);
        runner.run(session_id, user_message).await
    }

    /// Truncate a session's history; returns whether the truncation was
    /// persisted
    pub fn clear_history(&self, session_id: &str) -> bool {
        match self.memory.clear(session_id) {
            Ok(()) => true,
            Err(e) => {
                log_error("🗑️", format!("Failed to clear session '{}': {}", session_id, e));
                false
            }
        }
    }

    /// Remove a session entirely. Idempotent.
    pub fn delete_session(&self, session_id: &str) -> Result<(), AssistantError> {
        self.memory.store().delete(session_id)
    }

    /// True when sessions will not survive a process restart
    pub fn is_degraded(&self) -> bool {
        self.memory.store().is_degraded()
    }

    pub fn model_name(&self) -> &str {
        self.synthesizer.model_name()
    }
}
