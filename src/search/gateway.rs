use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use super::provider::{SearchHit, SearchProvider, TavilyProvider, WikipediaProvider};
use crate::app::SearchConfig;
use crate::utils::AssistantError;

/// Normalized search context ready for response synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct SearchContext {
    /// Formatted, markup-free block of numbered sources
    pub text: String,
    /// Which provider produced the results
    pub source: String,
}

/// Result of a gateway search. Unavailability is an outcome, not an
/// error: the turn proceeds with a degraded answer.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Context(SearchContext),
    Unavailable,
}

/// Issues queries to the primary provider and falls back to the
/// secondary on failure or empty results. Exactly one fallback, no
/// retry loop: stale search results are worthless.
pub struct SearchGateway {
    primary: Box<dyn SearchProvider>,
    secondary: Box<dyn SearchProvider>,
    max_results: usize,
}

impl SearchGateway {
    pub fn new(
        primary: Box<dyn SearchProvider>,
        secondary: Box<dyn SearchProvider>,
        max_results: usize,
    ) -> Self {
        Self {
            primary,
            secondary,
            max_results,
        }
    }

    /// Build the default Tavily-then-Wikipedia gateway from configuration
    pub fn from_config(config: &SearchConfig) -> Result<Self, AssistantError> {
        Ok(Self::new(
            Box::new(TavilyProvider::new(config)?),
            Box::new(WikipediaProvider::new()?),
            config.max_results,
        ))
    }

    /// Search for a query, never raising: both providers failing yields
    /// `SearchOutcome::Unavailable`
    pub async fn search(&self, query: &str) -> SearchOutcome {
        match self.try_provider(self.primary.as_ref(), query).await {
            Some(context) => return SearchOutcome::Context(context),
            None => warn!(
                "Primary search provider '{}' yielded nothing, falling back to '{}'",
                self.primary.name(),
                self.secondary.name()
            ),
        }

        match self.try_provider(self.secondary.as_ref(), query).await {
            Some(context) => SearchOutcome::Context(context),
            None => {
                warn!("Both search providers failed; proceeding without search context");
                SearchOutcome::Unavailable
            }
        }
    }

    async fn try_provider(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
    ) -> Option<SearchContext> {
        match provider.query(query, self.max_results).await {
            Ok(hits) if hits.is_empty() => None,
            Ok(hits) => {
                info!(
                    "🔎 {} returned {} result(s) for query",
                    provider.name(),
                    hits.len()
                );
                Some(SearchContext {
                    text: format_hits(&hits),
                    source: provider.name().to_string(),
                })
            }
            Err(e) => {
                warn!("Search provider '{}' failed: {}", provider.name(), e);
                None
            }
        }
    }
}

/// Format hits into a numbered source block, stripping provider markup
fn format_hits(hits: &[SearchHit]) -> String {
    let mut formatted = String::from("Search Results:\n\n");
    for (i, hit) in hits.iter().enumerate() {
        formatted.push_str(&format!("Source {}: {}\n", i + 1, strip_markup(&hit.title)));
        formatted.push_str(&format!("Content: {}\n", strip_markup(&hit.content)));
        if !hit.url.is_empty() {
            formatted.push_str(&format!("URL: {}\n", hit.url));
        }
        formatted.push('\n');
    }
    formatted.trim_end().to_string()
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Remove HTML tags and entities that providers embed in snippets
fn strip_markup(text: &str) -> String {
    let without_tags = TAG_RE.replace_all(text, "");
    let decoded = without_tags
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(decoded.trim(), " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StaticProvider {
        name: &'static str,
        hits: Vec<SearchHit>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SearchProvider for StaticProvider {
        async fn query(
            &self,
            _text: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchHit>, AssistantError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.clone())
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    struct FailingProvider {
        name: &'static str,
    }

    #[async_trait]
    impl SearchProvider for FailingProvider {
        async fn query(
            &self,
            _text: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchHit>, AssistantError> {
            Err(AssistantError::Search("boom".to_string()))
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn hit(title: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            content: format!("content about {}", title),
            url: format!("https://example.com/{}", title),
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let secondary_calls = Arc::new(AtomicUsize::new(0));
        let gateway = SearchGateway::new(
            Box::new(StaticProvider {
                name: "primary",
                hits: vec![hit("paris-weather")],
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(StaticProvider {
                name: "secondary",
                hits: vec![hit("unused")],
                calls: secondary_calls.clone(),
            }),
            3,
        );

        match gateway.search("weather in paris").await {
            SearchOutcome::Context(context) => {
                assert_eq!(context.source, "primary");
                assert!(context.text.contains("paris-weather"));
            }
            SearchOutcome::Unavailable => panic!("expected context"),
        }
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_to_secondary() {
        let gateway = SearchGateway::new(
            Box::new(FailingProvider { name: "primary" }),
            Box::new(StaticProvider {
                name: "secondary",
                hits: vec![hit("fallback")],
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            3,
        );

        match gateway.search("anything").await {
            SearchOutcome::Context(context) => assert_eq!(context.source, "secondary"),
            SearchOutcome::Unavailable => panic!("expected fallback context"),
        }
    }

    #[tokio::test]
    async fn test_empty_primary_results_fall_back() {
        let gateway = SearchGateway::new(
            Box::new(StaticProvider {
                name: "primary",
                hits: vec![],
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(StaticProvider {
                name: "secondary",
                hits: vec![hit("second-chance")],
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            3,
        );

        match gateway.search("anything").await {
            SearchOutcome::Context(context) => assert_eq!(context.source, "secondary"),
            SearchOutcome::Unavailable => panic!("expected fallback context"),
        }
    }

    #[tokio::test]
    async fn test_both_failing_is_unavailable_not_error() {
        let gateway = SearchGateway::new(
            Box::new(FailingProvider { name: "primary" }),
            Box::new(FailingProvider { name: "secondary" }),
            3,
        );

        assert_eq!(gateway.search("anything").await, SearchOutcome::Unavailable);
    }

    #[test]
    fn test_strip_markup_removes_tags_and_entities() {
        let snippet = r#"<span class="searchmatch">Paris</span> is the capital &amp; largest city"#;
        assert_eq!(strip_markup(snippet), "Paris is the capital & largest city");
    }

    #[test]
    fn test_format_hits_numbers_sources() {
        let hits = vec![hit("one"), hit("two")];
        let block = format_hits(&hits);
        assert!(block.starts_with("Search Results:"));
        assert!(block.contains("Source 1: one"));
        assert!(block.contains("Source 2: two"));
        assert!(block.contains("URL: https://example.com/two"));
    }
}
