use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("llm failed: {0}")]
    Llm(String),
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single web search hit.
///
/// Created by a search provider with title/url/snippet only; `content` stays
/// empty until the filter stage attaches fetched page text, at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub content: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            content: String::new(),
        }
    }

    /// Returns an updated copy with page text attached.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    /// Upper bound on results for this query; providers may return fewer.
    pub max_results: usize,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, q: &SearchQuery) -> Result<Vec<SearchResult>>;
}

/// Best-effort page text. Implementations never fail: invalid URLs, network
/// errors, non-200 statuses and text-free bodies all degrade to `""`.
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> String;
}

/// A finite, forward-only, non-restartable sequence of report text chunks.
///
/// An `Err` item is terminal: generation stops and there is no retry.
pub type ChunkStream = futures_util::stream::BoxStream<'static, Result<String>>;

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Single blocking chat completion; returns the full response text.
    async fn chat(&self, system: &str, user: &str) -> Result<String>;
    /// Incremental chat completion; chunks are forwarded as they arrive.
    async fn chat_stream(&self, system: &str, user: &str) -> Result<ChunkStream>;
}
