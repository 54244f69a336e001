use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::models::message::Message;

/// Body of `POST /inferences/server/modelstatus`.
#[derive(Debug, Serialize)]
pub struct ModelStatusRequest<'a> {
    pub model: &'a str,
    pub engine: &'a str,
}

impl<'a> ModelStatusRequest<'a> {
    pub fn new(config: &'a ModelConfig) -> Self {
        Self {
            model: &config.name,
            engine: config.engine.name(),
        }
    }
}

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub engine: &'a str,
    pub messages: &'a [Message],
    pub model: &'a str,
    pub stream: bool,
    pub stop: &'a [String],
}

impl<'a> ChatCompletionRequest<'a> {
    /// Requests are always streamed; there is no buffered completion mode.
    pub fn streaming(config: &'a ModelConfig, messages: &'a [Message]) -> Self {
        Self {
            engine: config.engine.name(),
            messages,
            model: &config.name,
            stream: true,
            stop: &config.stop,
        }
    }
}

/// One decoded `data:` payload of a streamed completion.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    pub delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}
