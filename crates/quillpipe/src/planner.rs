//! Topic Planner: turn free-form user text into searchable topics.

use quillpipe_core::LlmClient;

/// Hard cap on planned topics, whatever the model says.
pub const MAX_TOPICS: usize = 5;

const PLANNER_SYSTEM: &str = "You extract web-searchable research topics from user text. \
You output only a JSON array of strings and nothing else.";

fn planner_prompt(user_text: &str) -> String {
    format!(
        r#"Extract a list of research topics from the following text. Identify what the user wants to search for and return a maximum of {MAX_TOPICS} topics as a JSON array of strings.

Rules:
- If the user's intent is unclear or the input is meaningless, return an empty array.
- The research topics must be searchable on the web, clearly defined, and useful.
- Topics should be broad and researchable, avoiding overly specific or vague phrases.
- Output only a JSON array. No explanations, no additional text, no code fences.

Examples:

Input:
"What do you think about the relationship between quantum computers and AI?"
Output:
["Quantum computers and AI relationship", "Quantum AI algorithms", "Fundamentals of quantum computing", "AI optimization techniques", "Quantum hardware and applications"]

Input:
"lsdlsdlfjlsdfj"
Output:
[]

Now, generate a JSON array following these rules for the given text:

{user_text}"#
    )
}

/// Why a planner response could not be used as a topic list.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicParseError {
    #[error("planner response was not valid JSON")]
    NotJson,
    #[error("planner response was not a JSON array of strings")]
    NotAStringList,
}

/// Strict parse of the model's reply as a bare JSON array of strings.
///
/// An empty array is a valid outcome (unclear intent), distinct from a parse
/// failure; callers decide the fallback.
pub fn parse_topic_list(raw: &str) -> Result<Vec<String>, TopicParseError> {
    let value: serde_json::Value =
        serde_json::from_str(raw.trim()).map_err(|_| TopicParseError::NotJson)?;
    let items = value.as_array().ok_or(TopicParseError::NotAStringList)?;
    let mut topics = Vec::new();
    for item in items {
        let s = item.as_str().ok_or(TopicParseError::NotAStringList)?;
        topics.push(s.to_string());
        if topics.len() == MAX_TOPICS {
            break;
        }
    }
    Ok(topics)
}

/// Plan 0..=5 searchable topics for `user_text`.
///
/// An LLM error or unparsable reply falls back to `[user_text]` verbatim; an
/// intentionally-empty list from the model passes through as empty.
pub async fn plan_topics(llm: &dyn LlmClient, user_text: &str) -> Vec<String> {
    let raw = match llm.chat(PLANNER_SYSTEM, &planner_prompt(user_text)).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "planner llm call failed, falling back to the raw query");
            return vec![user_text.to_string()];
        }
    };
    match parse_topic_list(&raw) {
        Ok(topics) => topics,
        Err(e) => {
            tracing::warn!(error = %e, raw, "planner reply unparsable, falling back to the raw query");
            vec![user_text.to_string()]
        }
    }
}
