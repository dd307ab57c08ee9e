use std::time::Duration;

use quillpipe_core::{Error, Result};

pub mod extract;
pub mod fetch;
pub mod openai_compat;
pub mod search;

pub use fetch::PageFetcher;
pub use openai_compat::OpenAiCompatClient;
pub use search::GoogleSearchProvider;

/// Shared HTTP client for all backends.
///
/// No overall request timeout here: LLM calls run without a deadline, and the
/// page fetcher applies its own fixed per-request timeout. The connect
/// timeout avoids "hang forever" on DNS/TLS stalls.
pub fn default_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("quillpipe/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| Error::Fetch(e.to_string()))
}

pub(crate) fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
