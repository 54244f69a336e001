use crate::errors::{ChatError, ChatResult};

use super::types::ChatCompletionChunk;

/// Length of the wire framing marker (`data: `) in front of every payload.
pub const MIN_DATA_CHUNK_SIZE: usize = 6;
pub const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    Content(String),
    Done,
}

impl StreamChunk {
    /// Decode one framed chunk.
    ///
    /// The first [`MIN_DATA_CHUNK_SIZE`] bytes are skipped without being
    /// inspected. Anything at or below that length carries no content.
    pub fn parse(data: &[u8]) -> ChatResult<Self> {
        if data.len() <= MIN_DATA_CHUNK_SIZE {
            return Ok(StreamChunk::Content(String::new()));
        }

        let payload = String::from_utf8_lossy(&data[MIN_DATA_CHUNK_SIZE..]);
        if payload.contains(DONE_MARKER) {
            return Ok(StreamChunk::Done);
        }

        let chunk: ChatCompletionChunk =
            serde_json::from_str(payload.trim()).map_err(|e| ChatError::MalformedChunk {
                payload: payload.to_string(),
                reason: e.to_string(),
            })?;

        let choice = chunk
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::MalformedChunk {
                payload: payload.to_string(),
                reason: "no choices in chunk".to_string(),
            })?;

        Ok(StreamChunk::Content(choice.delta.content.unwrap_or_default()))
    }
}
