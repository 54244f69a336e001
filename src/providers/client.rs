use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use tracing::debug;

use crate::config::ModelConfig;
use crate::errors::{ChatError, ChatResult};

use super::stream::ChunkStream;
use super::types::{ChatCompletionRequest, ModelStatusRequest};

pub const MODEL_STATUS_PATH: &str = "/inferences/server/modelstatus";
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const CHAT_READ_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Ready,
    NotReady { status: u16, body: String },
}

/// Blocking HTTP client for a local inference server.
pub struct InferenceClient {
    client: Client,
    chat_client: Client,
    base_url: String,
}

impl InferenceClient {
    pub fn new(host: &str, port: u16) -> ChatResult<Self> {
        Self::with_read_timeout(host, port, CHAT_READ_TIMEOUT)
    }

    /// `read_timeout` bounds the wait for response headers and for each read
    /// of the chat body, never the stream as a whole. The status check waits
    /// indefinitely.
    pub fn with_read_timeout(host: &str, port: u16, read_timeout: Duration) -> ChatResult<Self> {
        let client = Client::builder().timeout(None::<Duration>).build()?;
        // The blocking client applies this per wait; a per-request timeout
        // would be a deadline for the whole body.
        let chat_client = Client::builder().timeout(read_timeout).build()?;

        let base_url = if host.contains("://") {
            format!("{}:{}", host.trim_end_matches('/'), port)
        } else {
            format!("http://{}:{}", host, port)
        };

        Ok(Self {
            client,
            chat_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the server whether `config`'s model is loaded.
    ///
    /// Any answer from the server is an `Ok`; only transport failures are errors.
    pub fn model_status(&self, config: &ModelConfig) -> ChatResult<ModelStatus> {
        let url = self.url(MODEL_STATUS_PATH);
        debug!(%url, model = %config.name, "checking model status");

        let response = self
            .client
            .post(&url)
            .json(&ModelStatusRequest::new(config))
            .send()?;

        match response.status() {
            StatusCode::OK => Ok(ModelStatus::Ready),
            status => Ok(ModelStatus::NotReady {
                status: status.as_u16(),
                body: response.text()?,
            }),
        }
    }

    /// Start a streamed chat completion. The returned stream pulls from the
    /// open response body as it is iterated.
    pub fn chat_completions(
        &self,
        request: &ChatCompletionRequest<'_>,
    ) -> ChatResult<ChunkStream<Response>> {
        let url = self.url(CHAT_COMPLETIONS_PATH);
        debug!(%url, messages = request.messages.len(), "sending chat completion");

        let response = self.chat_client.post(&url).json(request).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Server {
                status: status.as_u16(),
                body: response.text()?,
            });
        }

        Ok(ChunkStream::new(response))
    }
}
