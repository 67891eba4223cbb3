//! Story parameters and outline types.
//!
//! `FormState` holds everything the user chose in the wizard; the outline
//! synthesizer turns it into a `Story`. Form input is parsed leniently (see
//! [`lenient`]) while edits made through the wizard go through the validated
//! [`FormPatch`].

pub mod lenient;
mod synthesizer;

pub use synthesizer::{
    resolve_scene_count, synthesize, OutlineSynthesizer, DEFAULT_SCENE_COUNT, MAX_SCENES,
    MIN_SCENES,
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::styles::{self, DEFAULT_STYLE_ID};

/// Kind of story being written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    #[default]
    Fairytale,
    Journey,
    Memoir,
    /// Anything unrecognized; keeps the form usable
    Other,
}

impl StoryType {
    /// Parse a type name, accepting the Italian names used by older clients
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fairytale" | "fiaba" => StoryType::Fairytale,
            "journey" | "viaggio" => StoryType::Journey,
            "memoir" | "ricordo" => StoryType::Memoir,
            _ => StoryType::Other,
        }
    }

    /// Title used when the form leaves the title blank
    pub fn default_title(&self) -> &'static str {
        match self {
            StoryType::Fairytale => "La lanterna che parla",
            StoryType::Journey => "Taccuino di un faro",
            StoryType::Memoir | StoryType::Other => "Il profumo del mare",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StoryType::Fairytale => "Fiaba per bambini",
            StoryType::Journey => "Racconto di viaggio",
            StoryType::Memoir => "Ricordo di famiglia",
            StoryType::Other => "Altro",
        }
    }
}

impl<'de> Deserialize<'de> for StoryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map_or(StoryType::Other, StoryType::parse))
    }
}

/// Target reader age band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub enum ReaderAge {
    #[serde(rename = "3-5")]
    Toddler,
    #[default]
    #[serde(rename = "6-9")]
    Child,
    #[serde(rename = "10-12")]
    Preteen,
    #[serde(rename = "13+")]
    Teen,
}

impl ReaderAge {
    pub fn all() -> &'static [ReaderAge] {
        &[
            ReaderAge::Toddler,
            ReaderAge::Child,
            ReaderAge::Preteen,
            ReaderAge::Teen,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderAge::Toddler => "3-5",
            ReaderAge::Child => "6-9",
            ReaderAge::Preteen => "10-12",
            ReaderAge::Teen => "13+",
        }
    }

    /// Parse a band label; unknown labels fall back to the default band
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|age| age.as_str() == s)
            .unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for ReaderAge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(ReaderAge::parse).unwrap_or_default())
    }
}

/// Everything the user supplies to generate a story.
///
/// Missing fields take their defaults; malformed ones are tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    #[serde(rename = "type", alias = "tipo")]
    pub story_type: StoryType,
    #[serde(alias = "eta")]
    pub age: ReaderAge,
    /// Requested scene count; expected 4-12, resolved by the synthesizer
    #[serde(alias = "scene", deserialize_with = "lenient::count")]
    pub scene_count: Option<i64>,
    #[serde(alias = "protagonisti", deserialize_with = "lenient::text")]
    pub protagonists: String,
    #[serde(alias = "ambientazione", deserialize_with = "lenient::text")]
    pub setting: String,
    #[serde(alias = "tono", deserialize_with = "lenient::text")]
    pub tone: String,
    #[serde(alias = "stileId", deserialize_with = "lenient::text")]
    pub style_id: String,
    #[serde(alias = "titolo", deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(alias = "dedicataA", deserialize_with = "lenient::text")]
    pub dedication: String,
}

pub const DEFAULT_PROTAGONISTS: &str = "Luna (bimba curiosa), Otto (gatto parlante)";
pub const DEFAULT_SETTING: &str = "borgo sul mare in Sardegna, vicoli e fari";
pub const DEFAULT_TONE: &str = "magico, gentile, educativo";

impl Default for FormState {
    fn default() -> Self {
        Self {
            story_type: StoryType::Fairytale,
            age: ReaderAge::Child,
            scene_count: Some(DEFAULT_SCENE_COUNT as i64),
            protagonists: DEFAULT_PROTAGONISTS.to_string(),
            setting: DEFAULT_SETTING.to_string(),
            tone: DEFAULT_TONE.to_string(),
            style_id: DEFAULT_STYLE_ID.to_string(),
            title: String::new(),
            dedication: String::new(),
        }
    }
}

/// Rejected form edits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("scene count {0} is outside {min}..={max}", min = MIN_SCENES, max = MAX_SCENES)]
    SceneCountOutOfRange(i64),

    #[error("unknown style '{0}'")]
    UnknownStyle(String),
}

/// A validated, typed edit to the form. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FormPatch {
    #[serde(rename = "type")]
    pub story_type: Option<StoryType>,
    pub age: Option<ReaderAge>,
    pub scene_count: Option<i64>,
    pub protagonists: Option<String>,
    pub setting: Option<String>,
    pub tone: Option<String>,
    pub style_id: Option<String>,
    pub title: Option<String>,
    pub dedication: Option<String>,
}

impl FormPatch {
    /// Patch that only changes the selected style
    pub fn style(style_id: impl Into<String>) -> Self {
        Self {
            style_id: Some(style_id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FormPatch::default()
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if let Some(count) = self.scene_count {
            let in_range = usize::try_from(count)
                .map(|n| (MIN_SCENES..=MAX_SCENES).contains(&n))
                .unwrap_or(false);
            if !in_range {
                return Err(FormError::SceneCountOutOfRange(count));
            }
        }
        if let Some(ref id) = self.style_id {
            if !styles::list_styles().iter().any(|s| &s.id == id) {
                return Err(FormError::UnknownStyle(id.clone()));
            }
        }
        Ok(())
    }

    /// Validate and apply to `form`. On error the form is unchanged.
    pub fn apply(self, form: &mut FormState) -> Result<(), FormError> {
        self.validate()?;

        if let Some(story_type) = self.story_type {
            form.story_type = story_type;
        }
        if let Some(age) = self.age {
            form.age = age;
        }
        if let Some(count) = self.scene_count {
            form.scene_count = Some(count);
        }
        if let Some(protagonists) = self.protagonists {
            form.protagonists = protagonists;
        }
        if let Some(setting) = self.setting {
            form.setting = setting;
        }
        if let Some(tone) = self.tone {
            form.tone = tone;
        }
        if let Some(style_id) = self.style_id {
            form.style_id = style_id;
        }
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(dedication) = self.dedication {
            form.dedication = dedication;
        }
        Ok(())
    }
}

/// One narrative beat of the outline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Scene {
    /// 1-based position in the outline
    pub id: u32,
    #[serde(alias = "scene")]
    pub label: String,
    pub text: String,
}

/// Join an outline into the story's full text
pub fn join_outline(outline: &[Scene]) -> String {
    outline
        .iter()
        .map(|s| format!("{}: {}", s.label, s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A synthesized story.
///
/// `full_text` is derived from `outline` and is recomputed whenever the outline
/// changes, including when a story is deserialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", from = "StoryRecord")]
pub struct Story {
    pub title: String,
    pub dedication: String,
    outline: Vec<Scene>,
    full_text: String,
}

/// Wire form of a story; `fullText` is accepted but never trusted
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoryRecord {
    #[serde(deserialize_with = "lenient::text")]
    title: String,
    #[serde(deserialize_with = "lenient::text")]
    dedication: String,
    outline: Vec<Scene>,
}

impl From<StoryRecord> for Story {
    fn from(record: StoryRecord) -> Self {
        Story::new(record.title, record.dedication, record.outline)
    }
}

impl Story {
    pub fn new(title: impl Into<String>, dedication: impl Into<String>, outline: Vec<Scene>) -> Self {
        let full_text = join_outline(&outline);
        Self {
            title: title.into(),
            dedication: dedication.into(),
            outline,
            full_text,
        }
    }

    pub fn outline(&self) -> &[Scene] {
        &self.outline
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Replace the whole outline, recomputing the full text
    pub fn set_outline(&mut self, outline: Vec<Scene>) {
        self.full_text = join_outline(&outline);
        self.outline = outline;
    }

    pub fn is_empty(&self) -> bool {
        self.outline.is_empty()
    }
}
