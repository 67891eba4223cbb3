//! Handlebars-based outline synthesis.
//!
//! The outline is positional: the first scene introduces the cast in the
//! setting, the last one closes the story, and every scene in between shares
//! the same encounter beat. Output depends only on the form.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde_json::json;

use super::{FormState, Scene, Story, DEFAULT_PROTAGONISTS, DEFAULT_SETTING};

/// Scene count used when the form gives none, or a non-positive one
pub const DEFAULT_SCENE_COUNT: usize = 6;
pub const MIN_SCENES: usize = 4;
pub const MAX_SCENES: usize = 12;

const OPENING_TEMPLATE: &str =
    "Nel {{setting}}, {{protagonists}} scoprono un indizio luminoso che appare solo al tramonto.";
const ENCOUNTER_TEMPLATE: &str =
    "Un incontro inatteso guida i protagonisti più vicino al faro e a un mistero antico.";
const RESOLUTION_TEMPLATE: &str = "La magia rivela il suo segreto: il coraggio e la gentilezza cambiano davvero il mondo. Tutti festeggiano con lanterne sul mare.";

/// Resolve the requested scene count into the supported range
pub fn resolve_scene_count(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n > 0 => usize::try_from(n)
            .unwrap_or(MAX_SCENES)
            .clamp(MIN_SCENES, MAX_SCENES),
        _ => DEFAULT_SCENE_COUNT,
    }
}

/// Fill blank free-text fields with the form defaults
fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}

/// Renders story outlines from a form
pub struct OutlineSynthesizer {
    handlebars: Handlebars<'static>,
}

impl Default for OutlineSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineSynthesizer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Story text is plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(false);
        Self { handlebars }
    }

    fn scene_text(&self, index: usize, count: usize, form: &FormState) -> Result<String> {
        let template = if index == 1 {
            OPENING_TEMPLATE
        } else if index == count {
            RESOLUTION_TEMPLATE
        } else {
            ENCOUNTER_TEMPLATE
        };

        let context = json!({
            "setting": or_default(&form.setting, DEFAULT_SETTING),
            "protagonists": or_default(&form.protagonists, DEFAULT_PROTAGONISTS),
        });

        self.handlebars
            .render_template(template, &context)
            .with_context(|| format!("Failed to render scene {index}"))
    }

    /// Build the story for `form`.
    ///
    /// Malformed or missing form fields never fail; they resolve to defaults.
    pub fn synthesize(&self, form: &FormState) -> Result<Story> {
        let count = resolve_scene_count(form.scene_count);

        let outline = (1..=count)
            .map(|index| {
                Ok(Scene {
                    id: index as u32,
                    label: format!("Scena {index}"),
                    text: self.scene_text(index, count, form)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let title = match form.title.trim() {
            "" => form.story_type.default_title(),
            title => title,
        };

        tracing::debug!(
            scenes = count,
            story_type = ?form.story_type,
            "Synthesized story outline"
        );

        Ok(Story::new(title, form.dedication.trim(), outline))
    }
}

static SYNTHESIZER: Lazy<OutlineSynthesizer> = Lazy::new(OutlineSynthesizer::new);

/// Synthesize with the shared synthesizer
pub fn synthesize(form: &FormState) -> Result<Story> {
    SYNTHESIZER.synthesize(form)
}
