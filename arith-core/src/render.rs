//! Puzzle rendering: text -> embeddable image payload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::DEFAULT_PUZZLE_COLOR;

const TEXT_SIZE: u32 = 32;
const IMAGE_WIDTH: u32 = TEXT_SIZE * 8;
const IMAGE_HEIGHT: u32 = TEXT_SIZE * 2;
const BACKGROUND: &str = "black";

/// Turns puzzle text into a payload the client can display.
pub trait Renderer: Send + Sync {
    fn render(&self, text: &str, color: Option<&str>) -> String;
}

/// Returns the text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl Renderer for PlainText {
    fn render(&self, text: &str, _color: Option<&str>) -> String {
        text.to_string()
    }
}

/// Fixed-size SVG picture of the text, as a base64 data URI.
/// All images share one size so the puzzle length is not visible from the layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgDataUri;

impl SvgDataUri {
    pub fn svg(text: &str, color: &str) -> String {
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
                r#"<rect width="100%" height="100%" fill="{bg}"/>"#,
                r#"<text x="50%" y="50%" font-family="sans-serif" font-weight="bold" "#,
                r#"font-size="{size}" fill="{color}" text-anchor="middle" dominant-baseline="middle">"#,
                "{text}</text></svg>"
            ),
            w = IMAGE_WIDTH,
            h = IMAGE_HEIGHT,
            bg = BACKGROUND,
            size = TEXT_SIZE,
            color = escape_xml(color),
            text = escape_xml(text),
        )
    }
}

impl Renderer for SvgDataUri {
    fn render(&self, text: &str, color: Option<&str>) -> String {
        let svg = Self::svg(text, color.unwrap_or(DEFAULT_PUZZLE_COLOR));
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_identity() {
        assert_eq!(PlainText.render("12 + 34 = ", Some("red")), "12 + 34 = ");
    }

    #[test]
    fn svg_data_uri_decodes_to_picture() {
        let uri = SvgDataUri.render("12 + 34 = ", None);
        let b64 = uri.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = String::from_utf8(STANDARD.decode(b64).unwrap()).unwrap();
        assert!(svg.contains(">12 + 34 = </text>"));
        assert!(svg.contains(r#"fill="white""#));
        assert!(svg.contains(r#"width="256" height="64""#));
    }

    #[test]
    fn text_and_color_are_escaped() {
        let svg = SvgDataUri::svg("<b>&", "\"red");
        assert!(svg.contains("&lt;b&gt;&amp;</text>"));
        assert!(svg.contains(r#"fill="&quot;red""#));
    }
}
