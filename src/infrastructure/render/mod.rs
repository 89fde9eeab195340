//! Local placeholder artwork used when no image generation service is wired in.

mod placeholder;

pub use placeholder::SvgPlaceholderRenderer;
