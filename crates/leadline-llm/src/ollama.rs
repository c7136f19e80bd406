//! Ollama chat client.
//!
//! Wire format: `POST {model, messages: [{role, content}], stream}`. A
//! non-streaming reply is a single `{message: {content}}` object; a streaming
//! reply is newline-delimited JSON chunks whose `message.content` pieces are
//! concatenated in arrival order until a chunk with `done: true`.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use leadline_core::config::LlmConfig;

use crate::error::BackendError;
use crate::prompt::PromptMessage;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub stream: bool,
}

/// A chat-completion capable model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

pub struct OllamaClient {
    client: reqwest::Client,
    url: String,
    model: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(|e| BackendError::Connection(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.api_url.clone(),
            model: config.model.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn send(&self, request: &CompletionRequest) -> Result<reqwest::Response, BackendError> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            stream: request.stream,
        };

        let mut attempt = 0u32;
        loop {
            debug!(url = %self.url, attempt = attempt + 1, "Sending chat request");
            let response = self.client.post(&self.url).json(&body).send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let code = status.as_u16();
            if self.retry.should_retry(attempt, code) {
                let delay = self.retry.delay(attempt);
                warn!(
                    status = code,
                    attempt = attempt + 1,
                    max_attempts = self.retry.max_attempts,
                    "Model endpoint unavailable, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Http { status: code, body });
        }
    }

    async fn read_whole(response: reqwest::Response) -> Result<String, BackendError> {
        let bytes = response.bytes().await?;
        let chunk: ChatChunk = serde_json::from_slice(&bytes)?;
        if let Some(err) = chunk.error {
            return Err(BackendError::Malformed(err));
        }
        chunk
            .message
            .map(|m| m.content)
            .ok_or_else(|| BackendError::Malformed("response has no message".to_string()))
    }

    async fn read_stream(response: reqwest::Response) -> Result<String, BackendError> {
        let mut stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        let mut out = String::new();

        while let Some(bytes) = stream.next().await {
            pending.extend_from_slice(&bytes?);
            while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                if apply_chunk(&line, &mut out)? {
                    return Ok(out);
                }
            }
        }

        // Final line without a trailing newline.
        apply_chunk(&pending, &mut out)?;
        Ok(out)
    }
}

/// Append one NDJSON line to `out`. Returns true once the stream is done.
fn apply_chunk(line: &[u8], out: &mut String) -> Result<bool, BackendError> {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }
    let chunk: ChatChunk = serde_json::from_str(trimmed)?;
    if let Some(err) = chunk.error {
        return Err(BackendError::Malformed(err));
    }
    if let Some(message) = chunk.message {
        out.push_str(&message.content);
    }
    Ok(chunk.done)
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let response = self.send(request).await?;
        if request.stream {
            Self::read_stream(response).await
        } else {
            Self::read_whole(response).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};

    #[derive(Clone)]
    struct MockState {
        hits: Arc<AtomicUsize>,
        fail_first: usize,
        fail_status: StatusCode,
    }

    async fn mock_chat(
        State(state): State<MockState>,
        Json(body): Json<serde_json::Value>,
    ) -> axum::response::Response {
        let n = state.hits.fetch_add(1, Ordering::SeqCst);
        if n < state.fail_first {
            return (state.fail_status, "upstream down").into_response();
        }
        if body["stream"] == true {
            let ndjson = concat!(
                "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
                "{\"message\":{\"role\":\"assistant\",\"content\":\"lo \"},\"done\":false}\n",
                "\n",
                "{\"message\":{\"role\":\"assistant\",\"content\":\"there\"},\"done\":false}\n",
                "{\"done\":true}\n",
            );
            return ndjson.into_response();
        }
        let last = body["messages"]
            .as_array()
            .and_then(|m| m.last())
            .and_then(|m| m["content"].as_str())
            .unwrap_or_default()
            .to_string();
        Json(serde_json::json!({
            "model": body["model"],
            "message": {"role": "assistant", "content": format!("echo: {last}")},
            "done": true
        }))
        .into_response()
    }

    /// Four tokens then `done`, each chunk half a second after the last.
    async fn slow_stream() -> axum::response::Response {
        let chunks = futures::stream::iter(0..5).then(|i| async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let line = if i < 4 {
                format!("{{\"message\":{{\"content\":\"t{i} \"}},\"done\":false}}\n")
            } else {
                "{\"done\":true}\n".to_string()
            };
            Ok::<_, std::io::Error>(axum::body::Bytes::from(line))
        });
        axum::body::Body::from_stream(chunks).into_response()
    }

    async fn start_mock_server(fail_first: usize, fail_status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            hits: hits.clone(),
            fail_first,
            fail_status,
        };
        let router = Router::new()
            .route("/api/chat", post(mock_chat))
            .route(
                "/broken",
                post(|| async { "{\"unexpected\": true}" }),
            )
            .route("/slow", post(slow_stream))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}", addr), hits)
    }

    fn client(url: String) -> OllamaClient {
        let config = LlmConfig {
            api_url: url,
            backoff_base_ms: 5,
            ..LlmConfig::default()
        };
        OllamaClient::new(&config).unwrap()
    }

    fn request(stream: bool) -> CompletionRequest {
        CompletionRequest {
            messages: vec![PromptMessage::system("be brief"), PromptMessage::user("hi")],
            stream,
        }
    }

    // ---- whole response ----

    #[tokio::test]
    async fn test_complete_non_streaming() {
        let (base, hits) = start_mock_server(0, StatusCode::OK).await;
        let text = client(format!("{base}/api/chat"))
            .complete(&request(false))
            .await
            .unwrap();
        assert_eq!(text, "echo: hi");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_message_is_malformed() {
        let (base, _) = start_mock_server(0, StatusCode::OK).await;
        let err = client(format!("{base}/broken"))
            .complete(&request(false))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    // ---- streaming ----

    #[tokio::test]
    async fn test_complete_streaming_concatenates_chunks() {
        let (base, _) = start_mock_server(0, StatusCode::OK).await;
        let text = client(format!("{base}/api/chat"))
            .complete(&request(true))
            .await
            .unwrap();
        assert_eq!(text, "Hello there");
    }

    #[tokio::test]
    async fn test_read_timeout_applies_per_chunk_not_whole_stream() {
        let (base, _) = start_mock_server(0, StatusCode::OK).await;
        let config = LlmConfig {
            api_url: format!("{base}/slow"),
            read_timeout_secs: 1,
            ..LlmConfig::default()
        };
        let text = OllamaClient::new(&config)
            .unwrap()
            .complete(&request(true))
            .await
            .unwrap();
        assert_eq!(text, "t0 t1 t2 t3 ");
    }

    #[test]
    fn test_apply_chunk_error_field() {
        let mut out = String::new();
        let err = apply_chunk(br#"{"error":"model not found"}"#, &mut out).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    // ---- retry ----

    #[tokio::test]
    async fn test_retries_gateway_errors_then_succeeds() {
        let (base, hits) = start_mock_server(2, StatusCode::SERVICE_UNAVAILABLE).await;
        let text = client(format!("{base}/api/chat"))
            .complete(&request(false))
            .await
            .unwrap();
        assert_eq!(text, "echo: hi");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (base, hits) = start_mock_server(10, StatusCode::BAD_GATEWAY).await;
        let err = client(format!("{base}/api/chat"))
            .complete(&request(false))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Http { status: 502, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_server_error() {
        let (base, hits) = start_mock_server(10, StatusCode::INTERNAL_SERVER_ERROR).await;
        let err = client(format!("{base}/api/chat"))
            .complete(&request(false))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Http { status: 500, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let err = client("http://127.0.0.1:9/api/chat".to_string())
            .complete(&request(false))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::BackendErrorKind::Connection);
    }
}
