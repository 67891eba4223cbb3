//! Scene illustration.
//!
//! An [`ImageProvider`] turns one scene into one [`Image`]. [`generate_images`]
//! drives a provider over a whole outline, one scene at a time in outline
//! order. The batch is all-or-nothing: the first failing scene aborts it and
//! no partial gallery is returned.

mod error;
pub mod openai;
pub mod placeholder;

pub use error::ImageError;
pub use openai::OpenAiImageProvider;
pub use placeholder::{render_placeholder, PlaceholderProvider};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{ImageProviderKind, ImagesConfig};
use crate::story::Scene;
use crate::styles::Style;

/// Captions keep at most this many characters of the scene text
pub const CAPTION_MAX_CHARS: usize = 120;
pub const ELLIPSIS: char = '…';

/// One illustration, tied to a scene by label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Image {
    /// Label of the illustrated scene
    pub scene: String,
    /// Data URI or remote URL
    pub url: String,
    pub caption: String,
}

impl Image {
    pub fn for_scene(scene: &Scene, url: impl Into<String>) -> Self {
        Self {
            scene: scene.label.clone(),
            url: url.into(),
            caption: caption(&scene.text),
        }
    }
}

/// Truncate scene text to a caption, marking truncation with an ellipsis
pub fn caption(text: &str) -> String {
    match text.char_indices().nth(CAPTION_MAX_CHARS) {
        Some((cut, _)) => {
            let mut caption = text[..cut].to_string();
            caption.push(ELLIPSIS);
            caption
        }
        None => text.to_string(),
    }
}

/// Prompt sent for one scene
pub fn scene_prompt(style: &Style, scene: &Scene) -> String {
    let style_prompt = match style.image_prompt.trim() {
        "" => "illustrazione",
        prompt => prompt,
    };
    format!(
        "{} Scene: {} Description: {}",
        style_prompt, scene.label, scene.text
    )
}

/// Capability to illustrate scenes
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Provider name (e.g., "openai", "placeholder")
    fn name(&self) -> &str;

    /// Whether the provider can be called (credentials present)
    fn is_configured(&self) -> bool;

    /// Illustrate one scene. `index` is the 0-based position in the outline.
    async fn illustrate(&self, index: usize, scene: &Scene, style: &Style)
        -> Result<Image, ImageError>;

    /// Error reported when `is_configured` is false
    fn not_configured_error(&self) -> ImageError {
        ImageError::not_configured(self.name(), "credentials")
    }
}

/// Illustrate every scene of `outline`, sequentially and all-or-nothing.
pub async fn generate_images(
    provider: &dyn ImageProvider,
    outline: &[Scene],
    style: &Style,
) -> Result<Vec<Image>, ImageError> {
    if outline.is_empty() {
        return Err(ImageError::EmptyOutline);
    }
    if !provider.is_configured() {
        return Err(provider.not_configured_error());
    }

    let mut images = Vec::with_capacity(outline.len());
    for (index, scene) in outline.iter().enumerate() {
        match provider.illustrate(index, scene, style).await {
            Ok(image) => {
                tracing::debug!(
                    provider = provider.name(),
                    scene = %scene.label,
                    "Scene illustrated"
                );
                images.push(image);
            }
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    scene = %scene.label,
                    completed = images.len(),
                    error = %e,
                    "Illustration batch aborted"
                );
                return Err(e);
            }
        }
    }

    tracing::info!(
        provider = provider.name(),
        count = images.len(),
        style = %style.id,
        "Illustrations generated"
    );
    Ok(images)
}

/// Build the provider selected by configuration
pub fn provider_from_config(config: &ImagesConfig) -> Result<Arc<dyn ImageProvider>, ImageError> {
    match config.provider {
        ImageProviderKind::Openai => Ok(Arc::new(OpenAiImageProvider::from_config(config)?)),
        ImageProviderKind::Placeholder => Ok(Arc::new(PlaceholderProvider::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scene(id: u32, text: &str) -> Scene {
        Scene {
            id,
            label: format!("Scena {id}"),
            text: text.to_string(),
        }
    }

    fn outline(n: u32) -> Vec<Scene> {
        (1..=n).map(|i| scene(i, "testo")).collect()
    }

    /// Provider that fails on one call and counts invocations
    struct ScriptedProvider {
        fail_on: Option<usize>,
        calls: AtomicUsize,
        configured: bool,
    }

    impl ScriptedProvider {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                fail_on,
                calls: AtomicUsize::new(0),
                configured: true,
            }
        }
    }

    #[async_trait]
    impl ImageProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn illustrate(
            &self,
            index: usize,
            scene: &Scene,
            _style: &Style,
        ) -> Result<Image, ImageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(index) {
                return Err(ImageError::upstream("scripted", 500, "upstream exploded"));
            }
            Ok(Image::for_scene(scene, format!("https://img.test/{index}.png")))
        }
    }

    #[test]
    fn test_caption_boundary() {
        let exact: String = "a".repeat(120);
        assert_eq!(caption(&exact), exact);

        let over: String = "b".repeat(121);
        let expected = format!("{}…", "b".repeat(120));
        assert_eq!(caption(&over), expected);

        assert_eq!(caption(""), "");
    }

    #[test]
    fn test_caption_counts_characters_not_bytes() {
        let text: String = "è".repeat(121);
        let truncated = caption(&text);
        assert_eq!(truncated.chars().count(), 121);
        assert!(truncated.ends_with('…'));
        assert_eq!(caption(&"è".repeat(120)), "è".repeat(120));
    }

    #[test]
    fn test_scene_prompt_format() {
        let style = Style {
            image_prompt: "acquerello morbido".to_string(),
            ..crate::styles::get_style(None).clone()
        };
        let prompt = scene_prompt(&style, &scene(2, "Un incontro"));
        assert_eq!(
            prompt,
            "acquerello morbido Scene: Scena 2 Description: Un incontro"
        );
    }

    #[test]
    fn test_scene_prompt_without_style_prompt() {
        let style = Style {
            id: String::new(),
            name: String::new(),
            palette: Vec::new(),
            description: String::new(),
            image_prompt: String::new(),
        };
        assert!(scene_prompt(&style, &scene(1, "x")).starts_with("illustrazione Scene:"));
    }

    #[tokio::test]
    async fn test_generate_images_one_per_scene_in_order() {
        let provider = ScriptedProvider::new(None);
        let images = generate_images(&provider, &outline(4), crate::styles::get_style(None))
            .await
            .unwrap();

        assert_eq!(images.len(), 4);
        for (i, image) in images.iter().enumerate() {
            assert_eq!(image.scene, format!("Scena {}", i + 1));
            assert_eq!(image.url, format!("https://img.test/{i}.png"));
        }
    }

    #[tokio::test]
    async fn test_third_failure_aborts_whole_batch() {
        let provider = ScriptedProvider::new(Some(2));
        let result =
            generate_images(&provider, &outline(5), crate::styles::get_style(None)).await;

        assert_eq!(
            result,
            Err(ImageError::upstream("scripted", 500, "upstream exploded"))
        );
        // Scenes 4 and 5 are never requested
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_outline_is_rejected_before_any_call() {
        let provider = ScriptedProvider::new(None);
        let result = generate_images(&provider, &[], crate::styles::get_style(None)).await;

        assert_eq!(result, Err(ImageError::EmptyOutline));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_never_called() {
        let mut provider = ScriptedProvider::new(None);
        provider.configured = false;
        let result =
            generate_images(&provider, &outline(2), crate::styles::get_style(None)).await;

        assert!(matches!(result, Err(ImageError::NotConfigured { .. })));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_provider_from_config_selects_placeholder() {
        let config = ImagesConfig {
            provider: ImageProviderKind::Placeholder,
            ..Default::default()
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "placeholder");
        assert!(provider.is_configured());
    }
}
