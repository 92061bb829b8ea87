//! Tavily web-search client, the agent's only tool.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::EngineError;

/// Tavily search endpoint.
const TAVILY_URL: &str = "https://api.tavily.com/search";

/// Results requested per search.
const MAX_RESULTS: usize = 5;

/// Blocking Tavily client.
pub struct SearchClient {
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl SearchClient {
    pub fn new(api_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Run one web search and return up to [`MAX_RESULTS`] results.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>, EngineError> {
        let body = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: MAX_RESULTS,
        };

        let response = self
            .client
            .post(TAVILY_URL)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    EngineError::Connection(TAVILY_URL.to_string())
                } else if e.is_timeout() {
                    EngineError::Timeout(self.timeout_secs)
                } else {
                    EngineError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EngineError::Search(format!("status {status}: {body}")));
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| EngineError::ResponseParsing(e.to_string()))?;

        Ok(parsed.results)
    }
}

/// One search hit, trimmed to what the model needs.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Render results as the tool-message content handed back to the model.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n   {}\n   {}\n", i + 1, r.title, r.url, r.content));
    }
    out
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
