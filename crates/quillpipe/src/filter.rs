//! Filter & Enrich: pick the most relevant hits, then attach page text.

use quillpipe_core::{ContentFetcher, LlmClient, SearchResult};

/// Hard cap on results carried into the report.
pub const MAX_SELECTED: usize = 3;

const FILTER_SYSTEM: &str = "You rank web search results by relevance to a query. \
You output only a JSON array of result objects and nothing else.";

fn filter_prompt(query: &str, results: &[SearchResult]) -> String {
    let serialized = serde_json::to_string(results).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"The following are search results for the query: {query}.
Each result is an object with "title", "url" and "snippet" fields.
Analyze these results and determine the most relevant ones for the query.
Return a JSON array of the top {MAX_SELECTED} most relevant results, based on comprehensiveness and accuracy, keeping the same object shape. Output only the JSON array.

{serialized}"#
    )
}

/// Why a relevance reply could not be used as a selection.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("relevance reply was not a JSON array of results")]
pub struct RelevanceParseError;

/// Strict parse of the model's reply as a JSON array of results, capped at 3.
pub fn parse_relevance_list(raw: &str) -> Result<Vec<SearchResult>, RelevanceParseError> {
    serde_json::from_str::<Vec<SearchResult>>(raw.trim())
        .map(|v| v.into_iter().take(MAX_SELECTED).collect())
        .map_err(|_| RelevanceParseError)
}

/// Select at most 3 relevant results and attach fetched page text to each.
///
/// The selection degrades rather than fails: an LLM error or unparsable reply
/// keeps the first 3 input items, unranked. Every returned item has had its
/// `content` set, to `""` when the fetch came back empty-handed.
pub async fn filter_and_enrich(
    llm: &dyn LlmClient,
    fetcher: &dyn ContentFetcher,
    results: Vec<SearchResult>,
    query: &str,
) -> Vec<SearchResult> {
    let selected = match llm.chat(FILTER_SYSTEM, &filter_prompt(query, &results)).await {
        Ok(raw) => match parse_relevance_list(&raw) {
            Ok(selected) => selected,
            Err(e) => {
                tracing::warn!(error = %e, raw, "relevance reply unparsable, keeping the first {MAX_SELECTED} results");
                first_unranked(results)
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "relevance llm call failed, keeping the first {MAX_SELECTED} results");
            first_unranked(results)
        }
    };

    let mut enriched = Vec::with_capacity(selected.len());
    for item in selected {
        let content = fetcher.fetch_text(&item.url).await;
        enriched.push(item.with_content(content));
    }
    enriched
}

fn first_unranked(results: Vec<SearchResult>) -> Vec<SearchResult> {
    results.into_iter().take(MAX_SELECTED).collect()
}
