use serde::Deserialize;

use quillpipe_core::{Error, Result, SearchProvider, SearchQuery, SearchResult};

use crate::env;

fn google_api_key_from_env() -> Option<String> {
    env("QUILLPIPE_GOOGLE_API_KEY").or_else(|| env("GOOGLE_SEARCH_API_KEY"))
}

fn google_cx_from_env() -> Option<String> {
    env("QUILLPIPE_GOOGLE_CX").or_else(|| env("GOOGLE_SEARCH_CX"))
}

fn google_endpoint_from_env() -> Option<String> {
    env("QUILLPIPE_GOOGLE_ENDPOINT")
}

/// Google Programmable Search (Custom Search JSON API).
#[derive(Debug, Clone)]
pub struct GoogleSearchProvider {
    client: reqwest::Client,
    api_key: String,
    cx: String,
    endpoint: String,
}

impl GoogleSearchProvider {
    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = google_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured(
                "missing QUILLPIPE_GOOGLE_API_KEY (or GOOGLE_SEARCH_API_KEY)".to_string(),
            )
        })?;
        let cx = google_cx_from_env().ok_or_else(|| {
            Error::NotConfigured("missing QUILLPIPE_GOOGLE_CX (or GOOGLE_SEARCH_CX)".to_string())
        })?;
        // Docs: https://developers.google.com/custom-search/v1/using_rest
        let endpoint = google_endpoint_from_env()
            .unwrap_or_else(|| "https://www.googleapis.com/customsearch/v1".to_string());
        Ok(Self {
            client,
            api_key,
            cx,
            endpoint,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleSearchResponse {
    #[serde(default)]
    items: Option<Vec<GoogleItem>>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[async_trait::async_trait]
impl SearchProvider for GoogleSearchProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn search(&self, q: &SearchQuery) -> Result<Vec<SearchResult>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", q.query.as_str()),
            ])
            .query(&[("num", q.max_results)])
            .send()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            // Keep the body in the error so the caller's log carries it.
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Search(format!("google search HTTP {status}: {body}")));
        }

        let parsed: GoogleSearchResponse = resp
            .json()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;

        let mut out = Vec::new();
        for item in parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .take(q.max_results)
        {
            out.push(SearchResult::new(
                item.title.unwrap_or_default(),
                item.link.unwrap_or_default(),
                item.snippet.unwrap_or_default(),
            ));
        }
        Ok(out)
    }
}
