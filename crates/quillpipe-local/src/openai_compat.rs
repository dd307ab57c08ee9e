use std::collections::VecDeque;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use quillpipe_core::{ChunkStream, Error, LlmClient, Result};

use crate::env;

/// OpenAI-compatible default endpoint (DeepInfra's chat surface).
pub const DEFAULT_BASE_URL: &str = "https://api.deepinfra.com/v1/openai";
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3";

/// Fixed sampling temperature for every call the pipeline makes.
pub const TEMPERATURE: f64 = 0.23;

const DONE_FRAME: &str = "[DONE]";

fn llm_api_key_from_env() -> Option<String> {
    env("QUILLPIPE_LLM_API_KEY").or_else(|| env("DEEPINFRA_API_KEY"))
}

fn llm_base_url_from_env() -> Option<String> {
    env("QUILLPIPE_LLM_BASE_URL")
}

fn llm_model_from_env() -> Option<String> {
    env("QUILLPIPE_LLM_MODEL")
}

/// Chat client for any OpenAI-compatible `chat/completions` endpoint.
///
/// LLM calls run without a request timeout; the host transport owns any
/// end-to-end deadline.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatClient {
    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = llm_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured("missing QUILLPIPE_LLM_API_KEY (or DEEPINFRA_API_KEY)".to_string())
        })?;
        let base_url = llm_base_url_from_env().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = llm_model_from_env().unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_chat_completions(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_builder(&self) -> reqwest::RequestBuilder {
        self.client
            .post(self.endpoint_chat_completions())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
    }

    fn request_body(&self, system: &str, user: &str, stream: bool) -> ChatCompletionsRequest {
        ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: Some(TEMPERATURE),
            stream: stream.then_some(true),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let resp = self
            .request_builder()
            .json(&self.request_body(system, user, false))
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "openai_compat chat.completions HTTP {status}"
            )));
        }

        let parsed: ChatCompletionsResponse =
            resp.json().await.map_err(|e| Error::Llm(e.to_string()))?;
        Ok(parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default())
    }

    async fn chat_stream(&self, system: &str, user: &str) -> Result<ChunkStream> {
        let resp = self
            .request_builder()
            .json(&self.request_body(system, user, true))
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "openai_compat chat.completions HTTP {status}"
            )));
        }

        Ok(sse_chunk_stream(resp.bytes_stream()))
    }
}

/// Turns an SSE `chat/completions` body into a stream of delta-content chunks.
///
/// A transport error is yielded once and terminates the stream; there is no
/// retry. Frames that are not JSON (keep-alives, comments) are skipped.
fn sse_chunk_stream<S, B, E>(bytes: S) -> ChunkStream
where
    S: futures_util::Stream<Item = std::result::Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    struct State<S> {
        inner: S,
        decoder: SseDecoder,
        pending: VecDeque<String>,
        done: bool,
    }

    let state = State {
        inner: bytes,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(chunk) = st.pending.pop_front() {
                return Some((Ok(chunk), st));
            }
            if st.done {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(bytes)) => {
                    for data in st.decoder.push(bytes.as_ref()) {
                        if data == DONE_FRAME {
                            st.done = true;
                            break;
                        }
                        if let Some(delta) = delta_content(&data) {
                            if !delta.is_empty() {
                                st.pending.push_back(delta);
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    st.pending.clear();
                    return Some((Err(Error::Llm(e.to_string())), st));
                }
                None => st.done = true,
            }
        }
    }))
}

fn delta_content(data: &str) -> Option<String> {
    let chunk: StreamChunk = serde_json::from_str(data).ok()?;
    chunk.choices.into_iter().next()?.delta.content
}

/// Incremental `data:` line decoder for `text/event-stream` bodies.
///
/// Bytes are buffered until a full line arrives, so frames (and multi-byte
/// characters) split across reads reassemble correctly.
#[derive(Debug, Default)]
struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(data) = line.strip_prefix("data:") {
                frames.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        frames
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}
