use std::time::Duration;

use quillpipe_core::{ContentFetcher, Error, Result};

use crate::extract;

/// Fixed per-fetch timeout. This is the only deadline in the pipeline.
pub const PAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Best-effort page-text fetcher for LLM/user-supplied URLs.
///
/// The public surface never fails: every error path degrades to `""` so a
/// dead link costs the report one excerpt, not the whole request.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: PAGE_FETCH_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_timeout(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn try_fetch_text(&self, url: &str) -> Result<String> {
        let url = url::Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Fetch(format!("page fetch HTTP {status}")));
        }
        let body = resp.text().await.map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(extract::paragraph_text(&body))
    }
}

#[async_trait::async_trait]
impl ContentFetcher for PageFetcher {
    async fn fetch_text(&self, url: &str) -> String {
        match self.try_fetch_text(url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(url, error = %e, "page fetch failed, continuing without content");
                String::new()
            }
        }
    }
}
