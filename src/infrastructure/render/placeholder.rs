use std::fmt::Write as _;

use crate::application::services::{PlaceholderRenderer, RenderedImage};
use crate::domain::DomainError;

const CANVAS: u32 = 512;
const BORDER_INSET: u32 = 50;
const BORDER_WIDTH: u32 = 3;
const FIRST_LINE_Y: u32 = 200;
const LINE_SPACING: u32 = 30;

/// Renders a white square with a black frame and centred caption as SVG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgPlaceholderRenderer;

impl SvgPlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }

    fn document(caption: &[String]) -> Result<String, std::fmt::Error> {
        let frame = CANVAS - 2 * BORDER_INSET;
        let mut svg = String::new();

        write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CANVAS}" height="{CANVAS}" viewBox="0 0 {CANVAS} {CANVAS}">"#
        )?;
        write!(
            svg,
            r#"<rect x="0" y="0" width="{CANVAS}" height="{CANVAS}" fill="white"/>"#
        )?;
        write!(
            svg,
            r#"<rect x="{BORDER_INSET}" y="{BORDER_INSET}" width="{frame}" height="{frame}" fill="none" stroke="black" stroke-width="{BORDER_WIDTH}"/>"#
        )?;

        let center = CANVAS / 2;
        for (idx, line) in caption.iter().enumerate() {
            let y = FIRST_LINE_Y + LINE_SPACING * idx as u32;
            write!(
                svg,
                r#"<text x="{center}" y="{y}" text-anchor="middle" dominant-baseline="hanging" font-family="monospace" font-size="16" fill="black">{}</text>"#,
                escape_xml(line)
            )?;
        }

        svg.push_str("</svg>");
        Ok(svg)
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}

impl PlaceholderRenderer for SvgPlaceholderRenderer {
    fn render(&self, caption: &[String]) -> Result<RenderedImage, DomainError> {
        let svg = Self::document(caption)
            .map_err(|err| DomainError::other(format!("local image generation error: {err}")))?;

        Ok(RenderedImage {
            mime: "image/svg+xml",
            bytes: svg.into_bytes(),
        })
    }
}
