//! Web search tool
//!
//! Provides web search via configurable providers (Brave, Serper)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::tools::SearchTool;
use crate::{Error, Result};

/// Results handed back to the model per query
const RESULT_LIMIT: usize = 5;

/// Search provider configuration
#[derive(Debug, Clone)]
pub enum SearchProvider {
    /// Brave Search API
    Brave {
        /// API key for Brave Search
        api_key: String,
    },
    /// Serper (Google) Search API
    Serper {
        /// API key for Serper
        api_key: String,
    },
}

/// Web search tool
pub struct WebSearchTool {
    provider: SearchProvider,
    client: reqwest::Client,
}

/// Search result from web search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title
    pub title: String,
    /// Result URL
    pub url: String,
    /// Result snippet/description
    pub snippet: String,
}

/// Brave Search API response
#[derive(Debug, Deserialize)]
struct BraveSearchResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    description: String,
}

/// Serper API response
#[derive(Debug, Deserialize)]
struct SerperSearchResponse {
    organic: Option<Vec<SerperResult>>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    title: String,
    link: String,
    snippet: String,
}

/// Serper API request body
#[derive(Debug, Serialize)]
struct SerperRequest {
    q: String,
    num: usize,
}

impl WebSearchTool {
    /// Create a new web search tool with Brave Search
    #[must_use]
    pub fn new_brave(api_key: String) -> Self {
        Self {
            provider: SearchProvider::Brave { api_key },
            client: reqwest::Client::new(),
        }
    }

    /// Create a new web search tool with Serper
    #[must_use]
    pub fn new_serper(api_key: String) -> Self {
        Self {
            provider: SearchProvider::Serper { api_key },
            client: reqwest::Client::new(),
        }
    }

    /// Perform a web search
    ///
    /// # Errors
    ///
    /// Returns error if the search request fails or response parsing fails
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        match &self.provider {
            SearchProvider::Brave { api_key } => self.search_brave(api_key, query).await,
            SearchProvider::Serper { api_key } => self.search_serper(api_key, query).await,
        }
    }

    /// Search using Brave Search API
    async fn search_brave(&self, api_key: &str, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get("https://api.search.brave.com/res/v1/web/search")
            .header("X-Subscription-Token", api_key)
            .query(&[("q", query), ("count", &RESULT_LIMIT.to_string())])
            .send()
            .await?;

        let response = response.error_for_status().map_err(Error::Http)?;
        let brave_response: BraveSearchResponse = response.json().await?;

        let results = brave_response
            .web
            .map(|web| {
                web.results
                    .into_iter()
                    .map(|r| SearchResult {
                        title: r.title,
                        url: r.url,
                        snippet: r.description,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(results)
    }

    /// Search using Serper API
    async fn search_serper(&self, api_key: &str, query: &str) -> Result<Vec<SearchResult>> {
        let request_body = SerperRequest {
            q: query.to_string(),
            num: RESULT_LIMIT,
        };

        let response = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let response = response.error_for_status().map_err(Error::Http)?;
        let serper_response: SerperSearchResponse = response.json().await?;

        let results = serper_response
            .organic
            .map(|organic| {
                organic
                    .into_iter()
                    .map(|r| SearchResult {
                        title: r.title,
                        url: r.link,
                        snippet: r.snippet,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(results)
    }
}

/// Format results as short readable lines for the follow-up completion
#[must_use]
pub(crate) fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }
    results
        .iter()
        .take(RESULT_LIMIT)
        .map(|r| format!("{} — {} ({})", r.title, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait(?Send)]
impl SearchTool for WebSearchTool {
    async fn lookup(&self, query: &str) -> String {
        match self.search(query).await {
            Ok(results) => format_results(&results),
            Err(e) => {
                tracing::warn!(error = %e, query, "web search failed");
                format!("Web search is unavailable right now ({e}).")
            }
        }
    }
}
