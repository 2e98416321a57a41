use thiserror::Error;

use crate::llm::LlmError;

/// Ways a chat request can fail. Weather and events problems never show up
/// here; they are absorbed as fallback data.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}
