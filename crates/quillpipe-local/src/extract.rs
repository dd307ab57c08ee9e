//! HTML to plain text for fetched pages.
//!
//! Intentionally "good enough" and deterministic, not a readability engine:
//! the report prompt only needs paragraph prose, so we take the text of every
//! paragraph element and join with newlines. No script execution, no
//! boilerplate scoring.

/// Text of every `<p>` element, joined with newlines.
///
/// Returns `""` for bodies with no paragraph elements (app shells, bare JSON,
/// error pages).
pub fn paragraph_text(html: &str) -> String {
    let doc = html_scraper::Html::parse_document(html);
    let Some(sel) = html_scraper::Selector::parse("p").ok() else {
        return String::new();
    };
    let mut paragraphs = Vec::new();
    for el in doc.select(&sel) {
        let text = el.text().collect::<String>();
        let text = text.trim();
        if !text.is_empty() {
            paragraphs.push(text.to_string());
        }
    }
    paragraphs.join("\n")
}
