use crate::error::ConfigError;
use secnum_dom::{Selector, parse_selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deepest heading level the engine tracks a counter for.
pub const MAX_LEVELS: usize = 6;

/// How a canonical prefix is put on the page. One engine uses exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplyStrategy {
    /// Rewrite the heading text to `prefix + " " + title` and fire edit
    /// signals so the host persists it. (Default)
    #[default]
    ContentRewrite,
    /// Insert a marker child holding only the number; the heading text is
    /// never touched.
    OverlayMarker,
}

/// One link of the classifier's resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelResolver {
    /// `h1`..`h6`.
    TagName,
    /// A known container class on the element or a near ancestor.
    ClassMarker,
    /// Computed font size against [`FontThresholds`].
    FontSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMarker {
    pub class: String,
    pub level: u8,
}

impl ClassMarker {
    pub fn new(class: impl Into<String>, level: u8) -> Self {
        Self {
            class: class.into(),
            level,
        }
    }
}

/// Minimum font sizes (px) for the style-based fallback.
///
/// Tuned against one host's stylesheet; expect to override them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontThresholds {
    pub level1: f32,
    pub level2: f32,
    pub level3: f32,
}

impl Default for FontThresholds {
    fn default() -> Self {
        Self {
            level1: 40.0,
            level2: 30.0,
            level3: 24.0,
        }
    }
}

impl FontThresholds {
    pub fn level_for(&self, px: f32) -> Option<u8> {
        if px >= self.level1 {
            Some(1)
        } else if px >= self.level2 {
            Some(2)
        } else if px >= self.level3 {
            Some(3)
        } else {
            None
        }
    }
}

/// User-facing engine configuration.
///
/// Every field has a default, so a JSON document only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumberingConfig {
    pub strategy: ApplyStrategy,
    /// Classifier chain, first resolver that yields a level wins.
    pub resolvers: Vec<LevelResolver>,
    pub class_markers: Vec<ClassMarker>,
    /// How many ancestors above the element are checked for a class marker.
    pub marker_ancestor_depth: usize,
    pub font_thresholds: FontThresholds,
    /// Redundant heading queries; results are unioned and deduplicated.
    pub heading_selectors: Vec<String>,
    /// Main-content container candidates, tried in order.
    pub container_selectors: Vec<String>,
    pub debounce_ms: u64,
    pub observe_character_data: bool,
    /// Skip elements already carrying the done attribute (overlay only).
    pub exclude_processed: bool,
    pub number_empty_headings: bool,
    pub marker_class: String,
    pub done_attribute: String,
    /// Stylesheet element left behind by CSS-counter based versions.
    pub legacy_style_id: String,
    pub max_level: u8,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            strategy: ApplyStrategy::default(),
            resolvers: vec![
                LevelResolver::TagName,
                LevelResolver::ClassMarker,
                LevelResolver::FontSize,
            ],
            class_markers: notion_class_markers(),
            marker_ancestor_depth: 2,
            font_thresholds: FontThresholds::default(),
            heading_selectors: vec![
                "h1, h2, h3, h4, h5, h6".to_string(),
                "[role=\"heading\"]".to_string(),
            ],
            container_selectors: notion_containers(),
            debounce_ms: 500,
            observe_character_data: false,
            exclude_processed: false,
            number_empty_headings: false,
            marker_class: "secnum-marker".to_string(),
            done_attribute: "data-secnum-done".to_string(),
            legacy_style_id: "notion-auto-numbering-style".to_string(),
            max_level: MAX_LEVELS as u8,
        }
    }
}

fn notion_class_markers() -> Vec<ClassMarker> {
    vec![
        ClassMarker::new("notion-header-block", 1),
        ClassMarker::new("notion-sub_header-block", 2),
        ClassMarker::new("notion-sub_sub_header-block", 3),
    ]
}

fn notion_containers() -> Vec<String> {
    vec![
        ".notion-page-content".to_string(),
        ".notion-frame .notion-scroller".to_string(),
        ".notion-app-inner".to_string(),
    ]
}

impl NumberingConfig {
    /// Preset for Notion pages: block container classes decide the level
    /// (a top-level Notion heading is rendered as an `h2`), tag names and
    /// font size only back them up.
    pub fn notion() -> Self {
        Self {
            resolvers: vec![
                LevelResolver::ClassMarker,
                LevelResolver::TagName,
                LevelResolver::FontSize,
            ],
            heading_selectors: vec![
                ".notion-header-block > div > h2".to_string(),
                ".notion-sub_header-block > div > h3".to_string(),
                ".notion-sub_sub_header-block > div > h3".to_string(),
                ".notion-sub_sub_header-block > div > h4".to_string(),
            ],
            max_level: 3,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Validates the configuration and parses every selector once.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        if self.max_level == 0 || self.max_level as usize > MAX_LEVELS {
            return Err(ConfigError::MaxLevel(self.max_level));
        }
        if self.resolvers.is_empty() {
            return Err(ConfigError::NoResolvers);
        }
        if let Some(bad) = self
            .class_markers
            .iter()
            .find(|m| m.level == 0 || m.level > self.max_level)
        {
            return Err(ConfigError::MarkerLevel {
                class: bad.class.clone(),
                level: bad.level,
            });
        }
        let t = &self.font_thresholds;
        if !(t.level3 > 0.0 && t.level2 > t.level3 && t.level1 > t.level2) {
            return Err(ConfigError::FontThresholds);
        }
        check_identifier("markerClass", &self.marker_class)?;
        check_identifier("doneAttribute", &self.done_attribute)?;
        check_identifier("legacyStyleId", &self.legacy_style_id)?;

        let heading_selectors = parse_all(&self.heading_selectors)?;
        let container_selectors = parse_all(&self.container_selectors)?;
        let marker_selector = parse_selector(&format!(".{}", self.marker_class))?;
        let done_selector = parse_selector(&format!("[{}]", self.done_attribute))?;
        let legacy_style_selector = parse_selector(&format!("#{}", self.legacy_style_id))?;
        let heading_probe = parse_selector("h1, h2, h3, h4, h5, h6, [class*=\"heading\"]")?;
        let any_element = parse_selector("*")?;

        Ok(CompiledConfig {
            settings: self,
            heading_selectors,
            container_selectors,
            marker_selector,
            done_selector,
            legacy_style_selector,
            heading_probe,
            any_element,
        })
    }
}

fn parse_all(sources: &[String]) -> Result<Vec<Selector>, ConfigError> {
    sources
        .iter()
        .map(|s| parse_selector(s).map_err(ConfigError::from))
        .collect()
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Identifier {
            field,
            value: value.to_string(),
        })
    }
}

/// A validated configuration with every selector parsed.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub settings: NumberingConfig,
    pub heading_selectors: Vec<Selector>,
    pub container_selectors: Vec<Selector>,
    pub marker_selector: Selector,
    pub done_selector: Selector,
    pub legacy_style_selector: Selector,
    /// Used to spot headings inside an added subtree.
    pub heading_probe: Selector,
    pub any_element: Selector,
}

impl CompiledConfig {
    pub fn strategy(&self) -> ApplyStrategy {
        self.settings.strategy
    }
}
