use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::services::IdeaGenerator;
use crate::domain::DomainError;

use super::handle_http_error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Idea generator that proxies prompts to an Ollama chat completions endpoint.
pub struct OllamaIdeaGenerator {
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    agent: ureq::Agent,
}

impl OllamaIdeaGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_tokens,
            temperature,
            agent,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    pub fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

fn first_choice(response: ChatCompletionResponse) -> Result<String, DomainError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| DomainError::upstream("LLM response contained no choices"))
}

impl IdeaGenerator for OllamaIdeaGenerator {
    fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        let url = self.completions_url();
        debug!(%url, model = %self.model, "requesting chat completion");

        let response = self
            .agent
            .post(&url)
            .send_json(self.build_request(prompt))
            .map_err(handle_http_error)?;

        let parsed: ChatCompletionResponse = response.into_json().map_err(|err| {
            DomainError::upstream(format!("failed to parse LLM response: {err}"))
        })?;

        first_choice(parsed)
    }
}
