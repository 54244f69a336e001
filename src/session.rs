use tracing::{debug, info, warn, warn_span};
use uuid::Uuid;

use crate::config::ModelConfig;
use crate::errors::{ChatError, ChatResult};
use crate::models::history::History;
use crate::models::message::Message;
use crate::prompt::{InputType, Prompt};
use crate::providers::chunk::StreamChunk;
use crate::providers::client::{InferenceClient, ModelStatus};
use crate::providers::types::ChatCompletionRequest;

/// Interactive chat against one model on one inference server.
pub struct ChatSession<P> {
    id: String,
    client: InferenceClient,
    model: ModelConfig,
    prompt: P,
    history: History,
}

impl<P: Prompt> ChatSession<P> {
    pub fn new(host: &str, port: u16, model: ModelConfig, prompt: P) -> ChatResult<Self> {
        Ok(Self {
            id: format!("chat_{}", Uuid::new_v4().simple()),
            client: InferenceClient::new(host, port)?,
            model,
            prompt,
            history: History::new(),
        })
    }

    /// Identifier carried by every log line of this session.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Run the chat loop until the user types the exit command or input ends.
    ///
    /// `initial_message`, when non-empty, is sent as the first turn without
    /// reading from the prompt. A model that is not ready ends the session
    /// before anything is shown. Only a malformed stream chunk (or a failing
    /// prompt) makes this return an error.
    pub fn exec(&mut self, initial_message: Option<String>) -> ChatResult<()> {
        let span = warn_span!("chat_session", id = %self.id, model = %self.model.name);
        let _enter = span.enter();
        debug!(server = self.client.base_url(), "starting chat session");

        if !self.model_ready() {
            return Ok(());
        }

        self.prompt.show_exit_hint()?;

        let mut pending = initial_message.filter(|message| !message.is_empty());
        loop {
            let input = match pending.take() {
                Some(message) => self.prompt.preset_input(message)?,
                None => self.prompt.get_input()?,
            };

            match input.input_type {
                InputType::Exit => break,
                InputType::AskAgain => continue,
                InputType::Message => {
                    if let Some(content) = input.content {
                        self.send(&content)?;
                    }
                }
            }
        }

        info!(messages = self.history.len(), "chat session ended");
        Ok(())
    }

    fn model_ready(&self) -> bool {
        let engine = self.model.engine.name();
        if !self.model.engine.supports_model_status() {
            debug!(engine, "engine has no model status endpoint, skipping check");
            return true;
        }

        match self.client.model_status(&self.model) {
            Ok(ModelStatus::Ready) => true,
            Ok(ModelStatus::NotReady { status, body }) => {
                warn!(status, engine, "{}", body);
                false
            }
            Err(e) => {
                warn!(engine, "HTTP error: {}", e);
                false
            }
        }
    }

    /// One full turn. The assistant entry is recorded however the stream
    /// ended, so the history keeps alternating.
    fn send(&mut self, text: &str) -> ChatResult<()> {
        self.history.push(Message::user(text));

        let mut reply = String::new();
        let outcome = self.stream_reply(&mut reply);
        self.history.push(Message::assistant(&reply));

        outcome
    }

    fn stream_reply(&mut self, reply: &mut String) -> ChatResult<()> {
        let request = ChatCompletionRequest::streaming(&self.model, self.history.messages());
        let chunks = match self.client.chat_completions(&request) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("chat completion failed: {}", e);
                return Ok(());
            }
        };

        for chunk in chunks {
            match chunk {
                Ok(StreamChunk::Done) => {
                    self.prompt.render("\n")?;
                    break;
                }
                Ok(StreamChunk::Content(text)) => {
                    self.prompt.render(&text)?;
                    reply.push_str(&text);
                }
                Err(e @ ChatError::MalformedChunk { .. }) => return Err(e),
                Err(e) => {
                    warn!("stream ended early: {}", e);
                    break;
                }
            }
        }
        Ok(())
    }
}
