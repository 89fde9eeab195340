//! HTTP client for the local LLM endpoint used for tattoo ideas.
//!
//! Ollama exposes an OpenAI-compatible chat completions API; requests are
//! made with a blocking `ureq` agent from the blocking thread pool.

mod ollama_client;

pub use ollama_client::{ChatCompletionRequest, ChatMessage, OllamaIdeaGenerator};

use serde::Deserialize;

use crate::domain::DomainError;

/// Default Ollama base URL.
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";

/// Default chat model.
pub const DEFAULT_LLM_MODEL: &str = "llama3";

/// Error body returned by Ollama and most OpenAI-compatible servers.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Object { message: String },
}

impl ErrorDetail {
    fn into_message(self) -> String {
        match self {
            ErrorDetail::Message(message) | ErrorDetail::Object { message } => message,
        }
    }
}

/// Convert HTTP errors to domain errors.
pub fn handle_http_error(error: ureq::Error) -> DomainError {
    match error {
        ureq::Error::Status(code, response) => {
            if let Ok(body) = response.into_json::<ErrorBody>() {
                DomainError::upstream(format!(
                    "LLM HTTP {} - {}",
                    code,
                    body.error.into_message()
                ))
            } else {
                DomainError::upstream(format!("LLM HTTP error: {}", code))
            }
        }
        ureq::Error::Transport(transport) => {
            DomainError::upstream(format!("LLM transport error: {}", transport))
        }
    }
}
