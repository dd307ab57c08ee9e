//! Report Generator: build the context block and stream the article.

use quillpipe_core::{ChunkStream, LlmClient, Result, SearchResult};

/// Excerpt length per result inside the report context.
pub const EXCERPT_CHARS: usize = 200;

const NO_CONTENT_PLACEHOLDER: &str = "Content could not be retrieved.";

const REPORT_SYSTEM: &str = "You write comprehensive, fluent, informative Wikipedia-style \
articles in Markdown, grounded in the search results you are given.";

/// First 200 chars of `content` followed by an ellipsis marker, or a
/// placeholder sentence when nothing was retrieved. Truncation counts chars,
/// never bytes, so multi-byte text cannot split.
fn excerpt(content: &str) -> String {
    if content.is_empty() {
        return NO_CONTENT_PLACEHOLDER.to_string();
    }
    let mut out: String = content.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

/// The context block fed to the generation prompt: query header plus one
/// section per result (title, url, snippet, content excerpt).
pub fn build_report_context(query: &str, results: &[SearchResult]) -> String {
    let mut context = format!("**Search Query:** {query}\n\n");
    context.push_str("**Search Results:**\n");
    for res in results {
        context.push_str(&format!("### {}\n", res.title));
        context.push_str(&format!("**URL:** {}\n\n", res.url));
        context.push_str(&format!("**Snippet:** {}\n\n", res.snippet));
        context.push_str(&format!("**Content (Excerpt):** {}\n\n", excerpt(&res.content)));
    }
    context
}

fn report_prompt(context: &str) -> String {
    format!(
        r#"Below is a search query along with its search results.
Using the information provided, please generate a comprehensive, fluent, and informative Wikipedia-style article in Markdown format.
Insert references inside the references section.

{context}

Article:
"#
    )
}

/// Stream the Markdown article for `query` over the enriched results.
///
/// Chunks are forwarded as the model produces them; a mid-stream failure is
/// surfaced through the stream and ends generation, with no retry.
pub async fn generate_report(
    llm: &dyn LlmClient,
    query: &str,
    results: &[SearchResult],
) -> Result<ChunkStream> {
    let context = build_report_context(query, results);
    llm.chat_stream(REPORT_SYSTEM, &report_prompt(&context)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_embeds_query_and_result_fields() {
        let result = SearchResult::new("T", "U", "S").with_content("C".repeat(300));
        let context = build_report_context("Q", &[result]);
        assert!(context.contains("Q"));
        assert!(context.contains("T"));
        assert!(context.contains("U"));
        assert!(context.contains("S"));
        let expected_excerpt = format!("{}...", "C".repeat(EXCERPT_CHARS));
        assert!(context.contains(&expected_excerpt));
        // Full 300-char content must not appear.
        assert!(!context.contains(&"C".repeat(201)));
    }

    #[test]
    fn empty_content_uses_the_placeholder_sentence() {
        let result = SearchResult::new("T", "U", "S");
        let context = build_report_context("Q", &[result]);
        assert!(context.contains("Content could not be retrieved."));
        assert!(!context.contains("..."));
    }

    #[test]
    fn short_content_still_gets_an_ellipsis_marker() {
        assert_eq!(excerpt("brief"), "brief...");
    }

    #[test]
    fn excerpt_counts_chars_not_bytes() {
        // 300 multi-byte chars; byte-indexed slicing at 200 would panic.
        let content = "é".repeat(300);
        let out = excerpt(&content);
        assert_eq!(out.chars().count(), EXCERPT_CHARS + 3);
        assert!(out.starts_with("ééé"));
        assert!(out.ends_with("..."));
    }

    #[test]
    fn no_results_means_no_result_sections() {
        let context = build_report_context("Q", &[]);
        assert!(context.contains("**Search Query:** Q"));
        assert!(context.contains("**Search Results:**"));
        assert!(!context.contains("### "));
        assert!(!context.contains("**URL:**"));
    }
}
