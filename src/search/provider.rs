use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::app::SearchConfig;
use crate::constants::{SEARCH_TIMEOUT_SECS, TAVILY_API_URL, WIKIPEDIA_API_URL};
use crate::utils::AssistantError;

/// One result from a search provider
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// A remote search backend. Implementations must map every failure mode
/// (timeout, error response, quota) to `AssistantError::Search` so the
/// gateway can fall back.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<SearchHit>, AssistantError>;

    fn name(&self) -> &'static str;
}

fn search_client() -> Result<Client, AssistantError> {
    Client::builder()
        .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| AssistantError::Search(format!("Failed to build HTTP client: {}", e)))
}

/// Primary provider: Tavily search API (requires an API key)
pub struct TavilyProvider {
    client: Client,
    api_key: Option<String>,
}

impl TavilyProvider {
    pub fn new(config: &SearchConfig) -> Result<Self, AssistantError> {
        let api_key = std::env::var(&config.tavily_api_key_env)
            .ok()
            .filter(|k| !k.is_empty());
        Ok(Self {
            client: search_client()?,
            api_key,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<SearchHit>, AssistantError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AssistantError::Search("Tavily API key not configured".to_string()))?;

        let body = json!({
            "api_key": api_key,
            "query": text,
            "search_depth": "advanced",
            "max_results": max_results,
        });

        let response = self
            .client
            .post(TAVILY_API_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Search(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AssistantError::Search(format!(
                "Tavily returned {}",
                response.status()
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Search(format!("Malformed Tavily response: {}", e)))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                content: r.content,
                url: r.url,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
}

/// Secondary provider: Wikipedia search API (no key required)
pub struct WikipediaProvider {
    client: Client,
}

impl WikipediaProvider {
    pub fn new() -> Result<Self, AssistantError> {
        Ok(Self {
            client: search_client()?,
        })
    }
}

#[async_trait]
impl SearchProvider for WikipediaProvider {
    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<SearchHit>, AssistantError> {
        let response = self
            .client
            .get(WIKIPEDIA_API_URL)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", text),
                ("srlimit", &max_results.to_string()),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .send()
            .await
            .map_err(|e| AssistantError::Search(format!("Wikipedia request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AssistantError::Search(format!(
                "Wikipedia returned {}",
                response.status()
            )));
        }

        let parsed: WikipediaResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Search(format!("Malformed Wikipedia response: {}", e)))?;

        Ok(parsed
            .query
            .search
            .into_iter()
            .map(|r| {
                let url = format!(
                    "https://en.wikipedia.org/wiki/{}",
                    r.title.replace(' ', "_")
                );
                SearchHit {
                    title: r.title,
                    content: r.snippet,
                    url,
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "wikipedia"
    }
}

#[derive(Deserialize)]
struct WikipediaResponse {
    #[serde(default)]
    query: WikipediaQuery,
}

#[derive(Deserialize, Default)]
struct WikipediaQuery {
    #[serde(default)]
    search: Vec<WikipediaSearchResult>,
}

#[derive(Deserialize)]
struct WikipediaSearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}
