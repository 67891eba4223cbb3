//! Offline placeholder illustrations.
//!
//! Each scene becomes a small SVG built from the style palette and returned
//! inline as a base64 `data:` URI. Output is a pure function of its inputs.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{Image, ImageError, ImageProvider};
use crate::story::Scene;
use crate::styles::Style;

const PROVIDER_NAME: &str = "placeholder";

const DEFAULT_GRADIENT_START: &str = "#ddd";
const DEFAULT_GRADIENT_END: &str = "#bbb";
const DEFAULT_ACCENT: &str = "#999";

/// Escape text for inclusion in SVG markup
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn palette_color<'a>(palette: &'a [String], index: usize, default: &'a str) -> &'a str {
    palette.get(index).map(String::as_str).unwrap_or(default)
}

/// Render the placeholder SVG for the scene at `index`.
///
/// Palette entries 0 and 1 are the background gradient, entry 2 the accent
/// circle. Missing entries fall back to neutral greys.
pub fn render_placeholder(index: usize, palette: &[String], title: &str) -> String {
    let start = palette_color(palette, 0, DEFAULT_GRADIENT_START);
    let end = palette_color(palette, 1, DEFAULT_GRADIENT_END);
    let accent = palette_color(palette, 2, DEFAULT_ACCENT);
    let title = escape_xml(title);

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 800 500" width="800" height="500">
  <defs>
    <linearGradient id="grad-{index}" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0%" stop-color="{start}"/>
      <stop offset="100%" stop-color="{end}"/>
    </linearGradient>
  </defs>
  <rect width="800" height="500" fill="url(#grad-{index})"/>
  <circle cx="640" cy="140" r="90" fill="{accent}" opacity="0.6"/>
  <rect x="24" y="400" width="752" height="80" rx="16" fill="#ffffff" opacity="0.25"/>
  <text x="40" y="460" font-family="Georgia, serif" font-size="28" fill="#111827">{title}</text>
</svg>"##
    )
}

/// Wrap an SVG document as a base64 data URI
pub fn svg_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

/// Provider that never leaves the process
#[derive(Debug, Default, Clone)]
pub struct PlaceholderProvider;

impl PlaceholderProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageProvider for PlaceholderProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn illustrate(
        &self,
        index: usize,
        scene: &Scene,
        style: &Style,
    ) -> Result<Image, ImageError> {
        let svg = render_placeholder(index, &style.palette, &scene.label);
        Ok(Image::for_scene(scene, svg_data_uri(&svg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::generate_images;
    use crate::styles::get_style;

    fn palette(colors: &[&str]) -> Vec<String> {
        colors.iter().map(|c| c.to_string()).collect()
    }

    fn decode(uri: &str) -> String {
        let payload = uri
            .strip_prefix("data:image/svg+xml;base64,")
            .expect("svg data uri");
        String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"Tom & "Jerry" <gatti> l'amico"#),
            "Tom &amp; &quot;Jerry&quot; &lt;gatti&gt; l&apos;amico"
        );
        assert_eq!(escape_xml("Scena 1"), "Scena 1");
    }

    #[test]
    fn test_render_uses_palette() {
        let svg = render_placeholder(2, &palette(&["#111", "#222", "#333"]), "Scena 3");

        assert!(svg.contains(r#"viewBox="0 0 800 500""#));
        assert!(svg.contains(r#"id="grad-2""#));
        assert!(svg.contains(r#"fill="url(#grad-2)""#));
        assert!(svg.contains(r##"stop-color="#111""##));
        assert!(svg.contains(r##"stop-color="#222""##));
        assert!(svg.contains(r##"fill="#333" opacity="0.6""##));
        assert!(svg.contains(">Scena 3</text>"));
    }

    #[test]
    fn test_render_ignores_palette_beyond_third_color() {
        let colors = palette(&["#111", "#222", "#333", "#c0ffee"]);
        let svg = render_placeholder(0, &colors, "Scena 1");

        assert!(svg.contains("#333"));
        assert!(!svg.contains(colors[3].as_str()));
    }

    #[test]
    fn test_render_short_palette_uses_defaults() {
        let svg = render_placeholder(0, &palette(&["#abcdef"]), "x");
        assert!(svg.contains(r##"stop-color="#abcdef""##));
        assert!(svg.contains(r##"stop-color="#bbb""##));
        assert!(svg.contains(r##"fill="#999" opacity="0.6""##));

        let empty = render_placeholder(0, &[], "x");
        assert!(empty.contains(r##"stop-color="#ddd""##));
    }

    #[test]
    fn test_render_is_deterministic() {
        let colors = palette(&["#1", "#2", "#3"]);
        assert_eq!(
            render_placeholder(4, &colors, "Scena 5"),
            render_placeholder(4, &colors, "Scena 5")
        );
    }

    #[tokio::test]
    async fn test_placeholder_gallery() {
        let outline = vec![
            Scene {
                id: 1,
                label: "Scena 1".to_string(),
                text: "Nel borgo".to_string(),
            },
            Scene {
                id: 2,
                label: "Luna & Otto".to_string(),
                text: "Fine".to_string(),
            },
        ];
        let style = get_style(Some("noir-minimal"));

        let images = generate_images(&PlaceholderProvider::new(), &outline, style)
            .await
            .unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].scene, "Scena 1");
        assert_eq!(images[0].caption, "Nel borgo");

        let first = decode(&images[0].url);
        assert!(first.contains(r#"id="grad-0""#));
        assert!(first.contains(&format!(r#"stop-color="{}""#, style.palette[0])));

        let second = decode(&images[1].url);
        assert!(second.contains(r#"id="grad-1""#));
        assert!(second.contains(">Luna &amp; Otto</text>"));

        let again = generate_images(&PlaceholderProvider::new(), &outline, style)
            .await
            .unwrap();
        assert_eq!(images, again);
    }
}
