use tracing::{debug, error};

use super::synthesizer::ResponseSynthesizer;
use crate::classify::needs_search;
use crate::memory::ConversationMemory;
use crate::search::{SearchContext, SearchGateway, SearchOutcome};

/// Reply shown when synthesis fails entirely. The turn still persists so
/// the user's message is not lost and the conversation stays continuable.
pub const FALLBACK_REPLY: &str = "I'm sorry, I ran into a problem generating a response to \
that message. Your message has been kept in the conversation - please try again.";

/// Outcome of one orchestrated turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// The assistant's reply (possibly the fallback)
    pub response: String,
    /// Whether the classifier routed this turn through search
    pub searched: bool,
    /// Provider that supplied search context, if any
    pub search_source: Option<String>,
    /// False when the turn could not be persisted; the caller should
    /// warn the user that the exchange will not survive a restart
    pub saved: bool,
    /// True when the response is the synthesis-failure fallback
    pub fallback: bool,
}

/// Phases of a single turn. One machine instance per turn; sessions are
/// just data, not running processes.
enum TurnPhase {
    Classifying,
    Searching,
    Synthesizing { context: Option<SearchContext> },
    Persisting { response: String, fallback: bool },
}

/// Drives one user turn through classify, optional search, synthesis and
/// persistence. History is loaded once at the start and written once at
/// the end; no lock is held across the network calls.
pub struct TurnRunner<'a> {
    memory: &'a ConversationMemory,
    gateway: &'a SearchGateway,
    synthesizer: &'a ResponseSynthesizer,
}

impl<'a> TurnRunner<'a> {
    pub fn new(
        memory: &'a ConversationMemory,
        gateway: &'a SearchGateway,
        synthesizer: &'a ResponseSynthesizer,
    ) -> Self {
        Self {
            memory,
            gateway,
            synthesizer,
        }
    }

    /// Run the turn to completion. Never returns an error: every failure
    /// mode terminates in a well-formed report.
    pub async fn run(&self, session_id: &str, user_message: &str) -> TurnReport {
        let history = self.memory.history(session_id);
        let mut searched = false;
        let mut search_source = None;

        let mut phase = TurnPhase::Classifying;
        loop {
            phase = match phase {
                TurnPhase::Classifying => {
                    if needs_search(&history, user_message) {
                        debug!("Turn for '{}' routed through search", session_id);
                        TurnPhase::Searching
                    } else {
                        TurnPhase::Synthesizing { context: None }
                    }
                }

                TurnPhase::Searching => {
                    searched = true;
                    // Success, degraded and unavailable all proceed to
                    // synthesis with whatever context was obtained
                    match self.gateway.search(user_message).await {
                        SearchOutcome::Context(context) => {
                            search_source = Some(context.source.clone());
                            TurnPhase::Synthesizing {
                                context: Some(context),
                            }
                        }
                        SearchOutcome::Unavailable => TurnPhase::Synthesizing { context: None },
                    }
                }

                TurnPhase::Synthesizing { context } => {
                    match self
                        .synthesizer
                        .synthesize(&history, user_message, context.as_ref())
                        .await
                    {
                        Ok(response) => TurnPhase::Persisting {
                            response,
                            fallback: false,
                        },
                        Err(e) => {
                            error!("Synthesis failed for '{}': {}", session_id, e);
                            TurnPhase::Persisting {
                                response: FALLBACK_REPLY.to_string(),
                                fallback: true,
                            }
                        }
                    }
                }

                TurnPhase::Persisting { response, fallback } => {
                    // The user message and reply go in as a pair; on
                    // persist failure the reply is still returned, flagged
                    // unsaved
                    let saved = match self.memory.append_turn(session_id, user_message, &response) {
                        Ok(()) => true,
                        Err(e) => {
                            error!("Failed to persist turn for '{}': {}", session_id, e);
                            false
                        }
                    };
                    return TurnReport {
                        response,
                        searched,
                        search_source,
                        saved,
                        fallback,
                    };
                }
            };
        }
    }
}
