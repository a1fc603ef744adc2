use crate::actors::messages::AppError;
use crate::actors::traits::ChatTransport;
use crate::config::ChatConfig;
use crate::models::ConversationMessage;
use crate::stream::Utf8ChunkDecoder;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info};
use url::Url;

// --- Constants ---
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const STREAM_CHUNK_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body expected by the chat endpoint.
#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ConversationMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

/// Structured error body some endpoint failures carry (e.g. a 401).
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    message: Option<String>,
    details: Option<String>,
}

/// Streams answers from an HTTP chat endpoint.
///
/// The endpoint answers a POST of the conversation with a plain, unframed
/// UTF-8 text stream; end of body is end of answer.
#[derive(Clone)]
pub struct HttpChatTransport {
    client: Client,
    endpoint: Url,
    persona: Option<String>,
    request_timeout: Duration,
    chunk_timeout: Duration,
}

impl HttpChatTransport {
    pub fn new(endpoint: Url, persona: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            persona,
            request_timeout: REQUEST_TIMEOUT,
            chunk_timeout: STREAM_CHUNK_TIMEOUT,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self, AppError> {
        let mut transport = Self::new(config.endpoint_url()?, config.persona.clone());
        transport.request_timeout = config.request_timeout();
        transport.chunk_timeout = config.chunk_timeout();
        Ok(transport)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn stream_chat(
        &self,
        messages: Vec<ConversationMessage>,
        chunk_sender: mpsc::Sender<Result<String, AppError>>,
    ) -> Result<(), AppError> {
        info!("Posting {} messages to {}", messages.len(), self.endpoint);

        let payload = ChatRequest {
            messages: &messages,
            system: self.persona.as_deref(),
        };
        let request_future = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send();

        let res = timeout(self.request_timeout, request_future).await??;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = describe_error_body(&body);
            error!("Chat request failed with status {}: {}", status, message);
            return Err(AppError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = res.bytes_stream();
        let mut decoder = Utf8ChunkDecoder::new();

        while let Some(chunk) = timeout(self.chunk_timeout, stream.next()).await? {
            let chunk = chunk?;
            let text = decoder.decode(&chunk);
            if text.is_empty() {
                continue;
            }
            if chunk_sender.send(Ok(text)).await.is_err() {
                debug!("Chunk receiver dropped, abandoning stream");
                return Ok(());
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            let _ = chunk_sender.send(Ok(tail)).await;
        }

        Ok(())
    }
}

fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let mut parts = vec![parsed.error];
            parts.extend(parsed.message);
            parts.extend(parsed.details);
            parts.join(": ")
        }
        Err(_) => body.trim().to_string(),
    }
}
