use anyhow::Result;
use async_trait::async_trait;

use applyscout_common::RawSearchResult;
use tavily_client::TavilyClient;

/// Boundary to the web search provider. One call per query string.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<RawSearchResult>>;
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<RawSearchResult>> {
        let hits = TavilyClient::search(self, query).await?;
        Ok(hits
            .into_iter()
            .map(|hit| RawSearchResult {
                title: hit.title,
                url: hit.url,
                content: hit.content,
                score: hit.score,
            })
            .collect())
    }
}
