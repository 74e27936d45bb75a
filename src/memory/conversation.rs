use std::sync::Arc;
use tracing::debug;

use crate::models::Message;
use crate::store::{ConversationDocument, SessionStore};
use crate::utils::AssistantError;

/// In-process view of conversation histories, backed by the session
/// store. Every read goes through to the store, so there is no cache
/// invalidation protocol; a loaded document lives only for the span of
/// one operation. Concurrent writers resolve last-write-wins.
pub struct ConversationMemory {
    store: Arc<SessionStore>,
    keep_name_on_clear: bool,
}

impl ConversationMemory {
    pub fn new(store: Arc<SessionStore>, keep_name_on_clear: bool) -> Self {
        Self {
            store,
            keep_name_on_clear,
        }
    }

    /// Append a single message (read-modify-write through the store)
    pub fn append(&self, session_id: &str, message: Message) -> Result<(), AssistantError> {
        let mut document = self.store.read(session_id);
        document.push(message);
        document.derive_name();
        self.store.write(session_id, &document)
    }

    /// Append a user/assistant pair in one document write, so the user
    /// message can never be persisted after a later turn's messages
    pub fn append_turn(
        &self,
        session_id: &str,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<(), AssistantError> {
        let mut document = self.store.read(session_id);
        document.push(Message::user(user_text));
        document.push(Message::assistant(assistant_text));
        document.derive_name();
        debug!(
            "Persisting turn for '{}' ({} messages total)",
            session_id,
            document.messages.len()
        );
        self.store.write(session_id, &document)
    }

    /// Ordered message history for a session
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        self.store.read(session_id).messages
    }

    /// Truncate a session's history. Idempotent; the conversation name is
    /// preserved or reset per configuration.
    pub fn clear(&self, session_id: &str) -> Result<(), AssistantError> {
        let mut document = self.store.read(session_id);
        document.messages.clear();
        if !self.keep_name_on_clear {
            document.conversation_name = None;
        }
        document.last_modified = chrono::Local::now();
        self.store.write(session_id, &document)
    }

    /// Conversation name, or a deterministic placeholder when unset
    pub fn name(&self, session_id: &str) -> String {
        self.store.read(session_id).display_name()
    }

    /// Full document, for session info reporting
    pub fn document(&self, session_id: &str) -> ConversationDocument {
        self.store.read(session_id)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn memory(temp: &TempDir) -> ConversationMemory {
        let store = Arc::new(SessionStore::with_root(temp.path()));
        ConversationMemory::new(store, true)
    }

    #[test]
    fn test_append_then_history_preserves_order() {
        let temp = TempDir::new().unwrap();
        let memory = memory(&temp);

        let contents = ["m1", "m2", "m3", "m4", "m5"];
        for (i, content) in contents.iter().enumerate() {
            let message = if i % 2 == 0 {
                Message::user(*content)
            } else {
                Message::assistant(*content)
            };
            memory.append("s1", message).unwrap();
        }

        let history = memory.history("s1");
        let observed: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(observed, contents);
    }

    #[test]
    fn test_history_of_unknown_session_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(memory(&temp).history("never-written").is_empty());
    }

    #[test]
    fn test_append_turn_persists_pair_in_order() {
        let temp = TempDir::new().unwrap();
        let memory = memory(&temp);

        memory.append_turn("s1", "question", "answer").unwrap();

        let history = memory.history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "question");
        assert_eq!(history[1].content, "answer");
    }

    #[test]
    fn test_clear_twice_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let memory = memory(&temp);

        memory.append_turn("s1", "hello", "hi").unwrap();
        memory.clear("s1").unwrap();
        assert!(memory.history("s1").is_empty());

        memory.clear("s1").unwrap();
        assert!(memory.history("s1").is_empty());
    }

    #[test]
    fn test_clear_preserves_name_when_configured() {
        let temp = TempDir::new().unwrap();
        let memory = memory(&temp);

        memory.append_turn("s1", "name me after this", "done").unwrap();
        memory.clear("s1").unwrap();
        assert_eq!(memory.name("s1"), "name me after this");
    }

    #[test]
    fn test_clear_resets_name_when_configured() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(SessionStore::with_root(temp.path()));
        let memory = ConversationMemory::new(store, false);

        memory.append_turn("s1", "forget this title", "ok").unwrap();
        memory.clear("s1").unwrap();
        assert_eq!(memory.name("s1"), "Session s1");
    }

    #[test]
    fn test_name_placeholder_for_fresh_session() {
        let temp = TempDir::new().unwrap();
        assert_eq!(memory(&temp).name("abcdef1234567890"), "Session abcdef12");
    }
}
