pub mod error;

pub use error::{Result, TavilyError};

use std::time::Duration;

use serde::{Deserialize, Serialize};

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Client for the Tavily web search API.
pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    max_results: u32,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    api_key: String,
    query: String,
    search_depth: String,
    max_results: u32,
    topic: String,
    include_answer: bool,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// One search hit. `score` is provider-supplied relevance, unbounded.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    pub score: Option<f64>,
}

impl TavilyClient {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
            max_results: 20,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Run one advanced-depth search query.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            api_key: self.api_key.clone(),
            query: query.to_string(),
            search_depth: "advanced".to_string(),
            max_results: self.max_results,
            topic: "general".to_string(),
            include_answer: false,
            include_raw_content: false,
        };

        let resp = self
            .client
            .post(TAVILY_API_URL)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TavilyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = resp.json().await?;
        tracing::debug!(query, count = body.results.len(), "Tavily search complete");
        Ok(body.results)
    }
}
