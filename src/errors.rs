use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server error: {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Malformed stream chunk ({reason}): {payload}")]
    MalformedChunk { payload: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid model file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;
