//! Structure analysis logged at start-up.
//!
//! When numbering silently stops on a new host release, this report is the
//! first thing to read: it shows which heading classes the page uses now and
//! what font sizes its heading tags render at.

use crate::classifier::is_heading_like;
use crate::config::CompiledConfig;
use itertools::Itertools;
use log::warn;
use secnum_dom::HostDom;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const FONT_SAMPLES_PER_TAG: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    pub element_count: usize,
    pub heading_like_count: usize,
    /// Distinct class names containing `heading`, `header` or `title`.
    pub heading_class_names: Vec<String>,
    /// Up to five distinct font sizes per heading-like tag.
    pub font_sizes_by_tag: BTreeMap<String, Vec<f32>>,
    /// The first configured container selector that matches, if any.
    pub container: Option<String>,
}

impl fmt::Display for StructureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} elements, {} heading-like, container {}, classes [{}]",
            self.element_count,
            self.heading_like_count,
            self.container.as_deref().unwrap_or("<none>"),
            self.heading_class_names.iter().join(", ")
        )?;
        for (tag, sizes) in &self.font_sizes_by_tag {
            write!(f, "; {}: {}px", tag, sizes.iter().join("/"))?;
        }
        Ok(())
    }
}

pub fn analyze_structure<D: HostDom + ?Sized>(dom: &D, config: &CompiledConfig) -> StructureReport {
    let elements = match dom.query_all(None, &config.any_element) {
        Ok(elements) => elements,
        Err(e) => {
            warn!("Structure analysis failed: {}", e);
            return StructureReport::default();
        }
    };

    let heading_like: Vec<_> = elements
        .iter()
        .filter(|n| is_heading_like(dom, n))
        .collect();

    let heading_class_names = elements
        .iter()
        .flat_map(|n| dom.class_list(n))
        .filter(|c| c.contains("heading") || c.contains("header") || c.contains("title"))
        .sorted()
        .dedup()
        .collect();

    let font_sizes_by_tag = heading_like
        .iter()
        .filter_map(|n| Some((dom.tag_name(n)?, dom.font_size_px(n)?)))
        .into_group_map()
        .into_iter()
        .map(|(tag, sizes)| {
            let distinct = sizes
                .into_iter()
                .sorted_by(|a, b| b.total_cmp(a))
                .dedup()
                .take(FONT_SAMPLES_PER_TAG)
                .collect();
            (tag, distinct)
        })
        .collect();

    let container = config
        .container_selectors
        .iter()
        .find(|s| matches!(dom.query_first(None, s), Ok(Some(_))))
        .map(|s| s.source().to_string());

    StructureReport {
        element_count: elements.len(),
        heading_like_count: heading_like.len(),
        heading_class_names,
        font_sizes_by_tag,
        container,
    }
}
