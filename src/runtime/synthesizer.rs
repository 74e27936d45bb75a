use crate::app::ModelSettings;
use crate::models::{GenerationRequest, Message, MessageRole, Model};
use crate::search::SearchContext;
use crate::utils::AssistantError;

const DEFAULT_SYSTEM_PROMPT: &str = "You are Selkie, a helpful AI assistant engaged in a \
conversation with a user. Provide informative, relevant and helpful responses based on the \
conversation history. Be conversational and engaging while being informative. If search \
results are provided, incorporate that information naturally and cite sources where \
appropriate.";

const NO_SEARCH_NOTE: &str =
    "No web search was performed as it wasn't necessary for this query.";

/// Produces the assistant's reply for a turn by rendering the
/// conversation and any search context into a prompt and delegating to
/// the generation model
pub struct ResponseSynthesizer {
    model: Box<dyn Model>,
    settings: ModelSettings,
}

impl ResponseSynthesizer {
    pub fn new(model: Box<dyn Model>, settings: ModelSettings) -> Self {
        Self { model, settings }
    }

    /// Generate a reply. Model failures propagate as typed errors; an
    /// empty reply is an error in the model layer, never seen here.
    pub async fn synthesize(
        &self,
        history: &[Message],
        query: &str,
        search_context: Option<&SearchContext>,
    ) -> Result<String, AssistantError> {
        let request = GenerationRequest {
            system: Some(
                self.settings
                    .system_prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            ),
            prompt: render_prompt(history, query, search_context),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self.model.generate(&request).await?;
        Ok(response.content)
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

/// Render the turn prompt: transcript, current query, search block
fn render_prompt(history: &[Message], query: &str, search_context: Option<&SearchContext>) -> String {
    let search_info = match search_context {
        Some(context) => context.text.as_str(),
        None => NO_SEARCH_NOTE,
    };

    format!(
        "Conversation History:\n{}\nUser Query: {}\n\n{}\n\nBased on the above information, \
         provide a comprehensive, accurate and helpful response to the user's query.",
        render_transcript(history),
        query,
        search_info
    )
}

/// Flatten message history into a readable transcript
fn render_transcript(history: &[Message]) -> String {
    if history.is_empty() {
        return "(no prior messages)\n".to_string();
    }
    let mut transcript = String::new();
    for message in history {
        let speaker = match message.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        };
        transcript.push_str(&format!("{}: {}\n\n", speaker, message.content));
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_transcript_labels_speakers() {
        let history = vec![Message::user("hello"), Message::assistant("hi there")];
        let transcript = render_transcript(&history);
        assert_eq!(transcript, "User: hello\n\nAssistant: hi there\n\n");
    }

    #[test]
    fn test_prompt_includes_search_block_when_present() {
        let context = SearchContext {
            text: "Search Results:\n\nSource 1: Weather".to_string(),
            source: "tavily".to_string(),
        };
        let prompt = render_prompt(&[], "weather in Paris?", Some(&context));
        assert!(prompt.contains("Source 1: Weather"));
        assert!(!prompt.contains(NO_SEARCH_NOTE));
    }

    #[test]
    fn test_prompt_notes_when_no_search_happened() {
        let prompt = render_prompt(&[], "hello", None);
        assert!(prompt.contains(NO_SEARCH_NOTE));
    }
}
