// Query classification - decides whether a turn needs live web search.
//
// Search is expensive and can inject noise, so it is invoked selectively.
// This is a pure, deterministic heuristic with no side effects: recency
// cues and explicit lookup requests trigger search, fact-seeking
// questions trigger it when they mention entities the conversation has
// not covered yet, and smalltalk never does.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Message;

/// Words that, on their own, make up a smalltalk message
const SMALLTALK_WORDS: &[&str] = &[
    "hi", "hello", "hey", "yo", "thanks", "thank", "you", "thats", "that", "is", "all", "ok",
    "okay", "cool", "great", "nice", "bye", "goodbye", "good", "morning", "evening", "night",
    "no", "yes", "yep", "nope", "sure", "please", "awesome", "perfect", "got", "it",
];

/// Explicit requests to go look something up
static EXPLICIT_LOOKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(search( the web)?( for)?|look up|google|find out|check online)\b").unwrap()
});

/// Recency-indicating words: the answer may postdate the model's training
static TEMPORAL_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(today|tonight|yesterday|tomorrow|right now|currently|current|latest|recent|recently|this (week|month|year)|as of|breaking|upcoming)\b",
    )
    .unwrap()
});

/// Topics that are almost always time-sensitive factual lookups
static VOLATILE_TOPICS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(weather|forecast|news|headlines|stock|share price|price of|exchange rate|score|standings|release date|election|schedule)\b",
    )
    .unwrap()
});

/// Fact-seeking question openers
static FACTUAL_QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(who|what|when|where|which|how (many|much|old|far|tall|long))\b").unwrap()
});

/// Decide whether the latest user message warrants a web search.
///
/// Pure and deterministic: same inputs, same answer, no remote calls.
pub fn needs_search(history: &[Message], latest: &str) -> bool {
    let trimmed = latest.trim();
    if trimmed.is_empty() {
        return false;
    }

    if is_smalltalk(trimmed) {
        return false;
    }

    if EXPLICIT_LOOKUP.is_match(trimmed) {
        return true;
    }

    if TEMPORAL_CUES.is_match(trimmed) || VOLATILE_TOPICS.is_match(trimmed) {
        return true;
    }

    // Entity-heavy factual questions: search unless the conversation
    // already covers those entities
    if FACTUAL_QUESTION.is_match(trimmed) || trimmed.ends_with('?') {
        let entities = named_entities(trimmed);
        if entities.is_empty() {
            return false;
        }
        return !covered_by_history(history, &entities);
    }

    false
}

/// True when every word of the message is conversational filler
fn is_smalltalk(message: &str) -> bool {
    let mut words = message
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'').to_lowercase())
        .map(|w| w.replace('\'', ""))
        .filter(|w| !w.is_empty())
        .peekable();

    if words.peek().is_none() {
        return true;
    }
    words.all(|w| SMALLTALK_WORDS.contains(&w.as_str()))
}

/// Capitalized tokens past the first word, lowercased for matching
fn named_entities(message: &str) -> Vec<String> {
    message
        .split_whitespace()
        .skip(1)
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().next().is_some_and(|c| c.is_ascii_uppercase()))
        .map(|w| w.to_lowercase())
        .collect()
}

/// True when every entity already appears in the recent conversation
fn covered_by_history(history: &[Message], entities: &[String]) -> bool {
    let window: String = history
        .iter()
        .rev()
        .take(6)
        .map(|m| m.content.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");

    !window.is_empty() && entities.iter().all(|e| window.contains(e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_question_needs_search() {
        assert!(needs_search(&[], "What's the weather in Paris today?"));
    }

    #[test]
    fn test_gratitude_never_searches() {
        assert!(!needs_search(&[], "Thanks, that's all"));
        assert!(!needs_search(&[], "thank you!"));
        assert!(!needs_search(&[], "ok cool"));
    }

    #[test]
    fn test_greeting_never_searches() {
        assert!(!needs_search(&[], "Hello!"));
        assert!(!needs_search(&[], "good morning"));
    }

    #[test]
    fn test_explicit_lookup_request() {
        assert!(needs_search(&[], "search for rust 1.80 release notes"));
        assert!(needs_search(&[], "Can you look up the ISS orbit altitude"));
    }

    #[test]
    fn test_temporal_cues_trigger_search() {
        assert!(needs_search(&[], "what happened in the news this week"));
        assert!(needs_search(&[], "who is currently the UN secretary general"));
    }

    #[test]
    fn test_entity_question_searches_when_uncovered() {
        assert!(needs_search(&[], "When was Marie Curie born?"));
    }

    #[test]
    fn test_entity_question_skips_search_when_covered() {
        let history = vec![
            Message::user("Tell me about Marie Curie"),
            Message::assistant("Marie Curie was a physicist and chemist..."),
        ];
        assert!(!needs_search(&history, "How old was Marie Curie then?"));
    }

    #[test]
    fn test_plain_question_without_entities_answers_from_context() {
        assert!(!needs_search(&[], "what is a borrow checker?"));
    }

    #[test]
    fn test_empty_input_never_searches() {
        assert!(!needs_search(&[], ""));
        assert!(!needs_search(&[], "   "));
    }

    #[test]
    fn test_deterministic_across_calls() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let inputs = [
            "What's the weather in Paris today?",
            "Thanks, that's all",
            "When was Marie Curie born?",
        ];
        for input in inputs {
            let first = needs_search(&history, input);
            for _ in 0..10 {
                assert_eq!(first, needs_search(&history, input));
            }
        }
    }
}
