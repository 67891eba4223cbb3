//! OpenAI images API provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

use super::{scene_prompt, Image, ImageError, ImageProvider};
use crate::config::ImagesConfig;
use crate::story::Scene;
use crate::styles::Style;

const PROVIDER_NAME: &str = "openai";
const GENERATIONS_PATH: &str = "/v1/images/generations";

/// Remote image provider: one `POST /v1/images/generations` per scene
pub struct OpenAiImageProvider {
    api_key: Option<String>,
    api_key_env: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
    size: String,
    quality: String,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: String,
    size: &'a str,
    quality: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl ImageData {
    /// Prefer a hosted URL; inline base64 payloads become data URIs
    fn into_reference(self) -> Option<String> {
        match (self.url, self.b64_json) {
            (Some(url), _) if !url.is_empty() => Some(url),
            (_, Some(b64)) if !b64.is_empty() => Some(format!("data:image/png;base64,{b64}")),
            _ => None,
        }
    }
}

impl OpenAiImageProvider {
    /// Create a provider with an explicit API key (`None` = not configured)
    pub fn new(config: &ImagesConfig, api_key: Option<String>) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ImageError::network(PROVIDER_NAME, e.to_string()))?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            api_key_env: config.api_key_env.clone(),
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
        })
    }

    /// Create provider reading the key from the configured environment variable
    pub fn from_config(config: &ImagesConfig) -> Result<Self, ImageError> {
        let api_key = env::var(&config.api_key_env).ok();
        if api_key.as_deref().map_or(true, str::is_empty) {
            tracing::warn!(
                env = %config.api_key_env,
                "Image API key not set; illustration requests will fail"
            );
        }
        Self::new(config, api_key)
    }

    /// Point the provider at another server (mock upstreams, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GENERATIONS_PATH)
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn not_configured_error(&self) -> ImageError {
        ImageError::not_configured(PROVIDER_NAME, self.api_key_env.as_str())
    }

    async fn illustrate(
        &self,
        _index: usize,
        scene: &Scene,
        style: &Style,
    ) -> Result<Image, ImageError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| self.not_configured_error())?;

        let request_body = ImageGenerationRequest {
            model: &self.model,
            prompt: scene_prompt(style, scene),
            size: &self.size,
            quality: &self.quality,
            n: 1,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ImageError::network(PROVIDER_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::upstream(PROVIDER_NAME, status.as_u16(), body));
        }

        let body: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| ImageError::malformed(PROVIDER_NAME, e.to_string()))?;

        let reference = body
            .data
            .into_iter()
            .next()
            .and_then(ImageData::into_reference)
            .ok_or_else(|| ImageError::malformed(PROVIDER_NAME, "response carried no image"))?;

        Ok(Image::for_scene(scene, reference))
    }
}
