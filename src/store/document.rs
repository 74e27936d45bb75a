use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::constants::{NAME_PREVIEW_CHARS, SESSION_ID_PLACEHOLDER_CHARS};
use crate::models::{Message, MessageRole};

/// The persisted representation of one session: its full message history
/// plus derived metadata. One document per session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDocument {
    pub session_id: String,
    pub conversation_name: Option<String>,
    pub messages: Vec<Message>,
    pub last_modified: DateTime<Local>,
}

impl ConversationDocument {
    /// Create an empty document for a session
    pub fn empty(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            conversation_name: None,
            messages: Vec::new(),
            last_modified: Local::now(),
        }
    }

    /// Append a message and bump the modification time
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.last_modified = Local::now();
    }

    /// Derive the conversation name from the first user message if unset
    pub fn derive_name(&mut self) {
        if self.conversation_name.is_some() {
            return;
        }
        if let Some(first_user) = self
            .messages
            .iter()
            .find(|m| m.role == MessageRole::User)
        {
            self.conversation_name = Some(preview(&first_user.content));
        }
    }

    /// Name for display: the stored name, or a deterministic placeholder
    /// built from the session id
    pub fn display_name(&self) -> String {
        match &self.conversation_name {
            Some(name) => name.clone(),
            None => {
                let prefix: String = self
                    .session_id
                    .chars()
                    .take(SESSION_ID_PLACEHOLDER_CHARS)
                    .collect();
                format!("Session {}", prefix)
            }
        }
    }
}

/// Truncated single-line preview of a message, used as the derived name
fn preview(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default().trim();
    if line.chars().count() > NAME_PREVIEW_CHARS {
        let cut: String = line.chars().take(NAME_PREVIEW_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_derive_name_from_first_user_message() {
        let mut doc = ConversationDocument::empty("abc");
        doc.push(Message::user("What is Rust?"));
        doc.push(Message::assistant("A systems programming language."));
        doc.derive_name();
        assert_eq!(doc.conversation_name.as_deref(), Some("What is Rust?"));
    }

    #[test]
    fn test_derive_name_truncates_long_messages() {
        let mut doc = ConversationDocument::empty("abc");
        doc.push(Message::user("x".repeat(200)));
        doc.derive_name();
        let name = doc.conversation_name.unwrap();
        assert!(name.ends_with("..."));
        assert!(name.chars().count() <= NAME_PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_derive_name_keeps_existing_name() {
        let mut doc = ConversationDocument::empty("abc");
        doc.conversation_name = Some("kept".to_string());
        doc.push(Message::user("something else"));
        doc.derive_name();
        assert_eq!(doc.conversation_name.as_deref(), Some("kept"));
    }

    #[test]
    fn test_display_name_placeholder_is_deterministic() {
        let doc = ConversationDocument::empty("0f8fad5b-d9cb-469f-a165-70867728950e");
        assert_eq!(doc.display_name(), "Session 0f8fad5b");
        assert_eq!(doc.display_name(), "Session 0f8fad5b");
    }
}
