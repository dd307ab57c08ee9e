//! Planner behavior against a real OpenAI-compatible client and a loopback
//! fake: parse fallback, empty-plan pass-through, and error fallback.

use axum::{routing::post, Json, Router};
use std::net::SocketAddr;
use std::sync::Mutex;

use quillpipe::planner;
use quillpipe_local::{default_client, OpenAiCompatClient};

// Env vars are process-global; serialize tests that mutate them.
static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvGuard {
    k: &'static str,
    prev: Option<String>,
}

impl EnvGuard {
    fn set(k: &'static str, v: &str) -> Self {
        let prev = std::env::var(k).ok();
        std::env::set_var(k, v);
        Self { k, prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        if let Some(v) = self.prev.take() {
            std::env::set_var(self.k, v);
        } else {
            std::env::remove_var(self.k);
        }
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn chat_reply(content: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

fn llm_at(addr: SocketAddr) -> OpenAiCompatClient {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _g1 = EnvGuard::set("QUILLPIPE_LLM_API_KEY", "test-key");
    let _g2 = EnvGuard::set("QUILLPIPE_LLM_BASE_URL", &format!("http://{addr}/v1/openai"));
    OpenAiCompatClient::from_env(default_client().expect("client")).expect("llm from_env")
}

#[tokio::test(flavor = "multi_thread")]
async fn parsable_topic_list_is_used_and_bounded() {
    let app = Router::new().route(
        "/v1/openai/chat/completions",
        post(|| async { chat_reply(r#"["t1","t2","t3","t4","t5","t6","t7"]"#) }),
    );
    let addr = serve(app).await;
    let llm = llm_at(addr);

    let topics = planner::plan_topics(&llm, "tell me everything").await;
    assert_eq!(topics.len(), planner::MAX_TOPICS);
    assert_eq!(topics[0], "t1");
}

#[tokio::test(flavor = "multi_thread")]
async fn unparsable_reply_falls_back_to_the_original_input() {
    let app = Router::new().route(
        "/v1/openai/chat/completions",
        post(|| async { chat_reply("Here are some great topics you could search for!") }),
    );
    let addr = serve(app).await;
    let llm = llm_at(addr);

    let topics = planner::plan_topics(&llm, "original input").await;
    assert_eq!(topics, vec!["original input".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn llm_http_error_falls_back_to_the_original_input() {
    let app = Router::new().route(
        "/v1/openai/chat/completions",
        post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(app).await;
    let llm = llm_at(addr);

    let topics = planner::plan_topics(&llm, "original input").await;
    assert_eq!(topics, vec!["original input".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_plan_from_the_model_passes_through() {
    let app = Router::new().route(
        "/v1/openai/chat/completions",
        post(|| async { chat_reply("[]") }),
    );
    let addr = serve(app).await;
    let llm = llm_at(addr);

    let topics = planner::plan_topics(&llm, "asdkjaslkdj").await;
    assert!(topics.is_empty());
}
