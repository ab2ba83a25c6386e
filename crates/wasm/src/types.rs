//! TypeScript-friendly type definitions.

use secnum_engine::{ApplyStrategy, NumberingConfig};
use wasm_bindgen::prelude::*;

/// Built-in configuration presets.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// Notion block markup: container classes decide the level.
    #[default]
    Notion,
    /// Plain `h1`..`h6` and `role="heading"` pages.
    Generic,
}

impl From<Preset> for NumberingConfig {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Notion => NumberingConfig::notion(),
            Preset::Generic => NumberingConfig::default(),
        }
    }
}

/// How numbers are put on the page.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Rewrite heading text so the host saves the number.
    #[default]
    ContentRewrite,
    /// Show the number in a marker element; page content is untouched.
    OverlayMarker,
}

impl From<Strategy> for ApplyStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::ContentRewrite => ApplyStrategy::ContentRewrite,
            Strategy::OverlayMarker => ApplyStrategy::OverlayMarker,
        }
    }
}
