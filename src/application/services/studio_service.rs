use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::{
    application::dtos::{IdeaResponse, ImageDataResponse, ImagePromptResponse},
    domain::DomainError,
};

/// Captions are wrapped so that no line reaches this many characters.
pub const CAPTION_LINE_LIMIT: usize = 30;

/// At most this many caption lines are drawn on a placeholder.
pub const CAPTION_MAX_LINES: usize = 3;

const EXTERNAL_IMAGE_MESSAGE: &str = "Image generation requires an external service like \
Stability AI, DALL-E, or local Stable Diffusion. Please implement the image generation \
logic with your preferred service.";

/// Text completion backend used for tattoo ideas (Ollama, OpenAI-compatible, ...).
pub trait IdeaGenerator: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, DomainError>;
}

/// Encoded image produced by a renderer.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl RenderedImage {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Draws a placeholder design with the given caption lines.
pub trait PlaceholderRenderer: Send + Sync {
    fn render(&self, caption: &[String]) -> Result<RenderedImage, DomainError>;
}

/// Generative helpers proxied by the backend: ideas and placeholder art.
pub struct StudioService {
    ideas: Arc<dyn IdeaGenerator>,
    renderer: Arc<dyn PlaceholderRenderer>,
}

impl StudioService {
    pub fn new(ideas: Arc<dyn IdeaGenerator>, renderer: Arc<dyn PlaceholderRenderer>) -> Self {
        Self { ideas, renderer }
    }

    pub fn generate_idea(&self, user_input: &str) -> Result<IdeaResponse, DomainError> {
        require_input(user_input)?;

        let idea = self.ideas.complete(&idea_prompt(user_input))?;
        let idea = idea.trim().to_string();
        if idea.is_empty() {
            return Err(DomainError::upstream("model returned an empty idea"));
        }

        debug!(chars = idea.len(), "generated tattoo idea");
        Ok(IdeaResponse { idea })
    }

    pub fn describe_image_request(
        &self,
        user_input: &str,
    ) -> Result<ImagePromptResponse, DomainError> {
        require_input(user_input)?;

        Ok(ImagePromptResponse {
            message: EXTERNAL_IMAGE_MESSAGE.to_string(),
            prompt: image_prompt(user_input),
        })
    }

    pub fn render_placeholder(&self, user_input: &str) -> Result<ImageDataResponse, DomainError> {
        require_input(user_input)?;

        let mut caption = wrap_caption(user_input);
        caption.truncate(CAPTION_MAX_LINES);

        let image = self.renderer.render(&caption)?;
        Ok(ImageDataResponse {
            image: image.to_data_url(),
        })
    }
}

fn require_input(user_input: &str) -> Result<(), DomainError> {
    if user_input.is_empty() {
        return Err(DomainError::validation("user_input is required"));
    }
    Ok(())
}

pub fn idea_prompt(user_input: &str) -> String {
    format!(
        "You are a creative tattoo designer. Given the following description of a person, \
generate a unique, meaningful tattoo idea for them. Keep it concise and creative.\n\
Description: {user_input}\nTattoo Idea:"
    )
}

pub fn image_prompt(user_input: &str) -> String {
    format!(
        "tattoo design, {user_input}, black and white, detailed line art, minimalist, clean design"
    )
}

/// Greedy word wrap: a word joins the current line only while the joined
/// line stays under `CAPTION_LINE_LIMIT` characters.
pub fn wrap_caption(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let joined_len = current.chars().count() + 1 + word.chars().count();
        if joined_len < CAPTION_LINE_LIMIT {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
