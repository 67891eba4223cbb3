//! Visual style catalog.
//!
//! A fixed set of illustration presets. Each style carries a palette used by
//! the placeholder renderer and a prompt fragment prepended to every image
//! request. Lookups never fail: an unknown or missing id resolves to the first
//! entry so a stale selection cannot block the pipeline.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named visual preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Ordered colors; the first three drive placeholder rendering
    #[serde(default)]
    pub palette: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Fragment prepended to every image prompt
    #[serde(default)]
    pub image_prompt: String,
}

/// Id of the style preselected in a fresh form
pub const DEFAULT_STYLE_ID: &str = "acquerello-pastello";

static CATALOG: Lazy<Vec<Style>> = Lazy::new(|| {
    vec![
        style(
            "olivetti-soft",
            "Olivetti Soft",
            &["#111827", "#f3f4f6", "#e5e7eb", "#374151"],
            "Geometrie pulite, tipografia moderna, accenti industrial-chic. Ideale per racconti contemporanei.",
            "illustrazione vettoriale pulita, palette minimal, ombre morbide, isometrico leggero, texture carta riciclata, stile modernista italiano",
        ),
        style(
            "acquerello-pastello",
            "Acquerello Pastello",
            &["#0b3954", "#bfd7ea", "#ff7f50", "#ffda77"],
            "Pennellate leggere, colori tenui e sfumature morbide. Perfetto per fiabe per bambini.",
            "acquerello morbido, colori pastello, bordi sfumati, carta ruvida, atmosfera sognante, luce calda",
        ),
        style(
            "noir-minimal",
            "Noir Minimal",
            &["#0f0f0f", "#fafafa", "#d1d5db", "#a1a1aa"],
            "Contrasti netti, linee essenziali, silhouette e ombre. Per racconti misteriosi o avventure urbane.",
            "illustrazione minimal in bianco e nero, luci drammatiche, silhouette, granulosità fine, atmosfera noir",
        ),
    ]
});

fn style(id: &str, name: &str, palette: &[&str], description: &str, image_prompt: &str) -> Style {
    Style {
        id: id.to_string(),
        name: name.to_string(),
        palette: palette.iter().map(|c| (*c).to_string()).collect(),
        description: description.to_string(),
        image_prompt: image_prompt.to_string(),
    }
}

/// All styles, in display order
pub fn list_styles() -> &'static [Style] {
    &CATALOG
}

/// Look up a style by id, falling back to the first catalog entry
pub fn get_style(id: Option<&str>) -> &'static Style {
    id.and_then(|id| CATALOG.iter().find(|s| s.id == id))
        .unwrap_or(&CATALOG[0])
}
