//! Discovers heading candidates across a structurally unstable page.
//!
//! Several alternative queries run on every scan and their results are
//! unioned: the host's internal markup is versioned and any one query may stop
//! matching. A query that fails is logged and skipped.

use crate::classifier::classify;
use crate::config::{ApplyStrategy, CompiledConfig};
use crate::prefix::strip_prefix;
use log::{debug, warn};
use secnum_dom::HostDom;

/// One heading found by a scan. Lives for a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate<N> {
    /// Live node; read and written in place, never copied.
    pub element: N,
    /// 1..=6, or 0 when the classifier could not resolve a level.
    pub level: u8,
    /// Visible heading text at scan time, overlay marker excluded.
    pub raw_text: String,
    /// Value of the done attribute left by a previous overlay pass.
    pub processed: Option<String>,
}

impl<N> HeadingCandidate<N> {
    /// The title without any existing number.
    pub fn title(&self) -> &str {
        strip_prefix(&self.raw_text).trim_end()
    }
}

/// Runs every heading query and returns the deduplicated candidates in
/// discovery order (not document order).
pub fn collect<D: HostDom + ?Sized>(
    dom: &D,
    config: &CompiledConfig,
) -> Vec<HeadingCandidate<D::Node>> {
    let mut found: Vec<D::Node> = Vec::new();
    for selector in &config.heading_selectors {
        match dom.query_all(None, selector) {
            Ok(nodes) => {
                debug!("Query '{}' matched {} element(s)", selector, nodes.len());
                for node in nodes {
                    if !found.contains(&node) {
                        found.push(node);
                    }
                }
            }
            Err(e) => warn!("Skipping heading query '{}': {}", selector, e),
        }
    }

    let innermost = drop_enclosing(dom, found);
    let settings = &config.settings;
    let skip_processed =
        settings.exclude_processed && settings.strategy == ApplyStrategy::OverlayMarker;

    innermost
        .into_iter()
        .filter_map(|element| {
            let processed = dom.attribute(&element, &settings.done_attribute);
            if skip_processed && processed.is_some() {
                return None;
            }
            let level = classify(dom, &element, settings);
            let raw_text = visible_text(dom, &element, config);
            Some(HeadingCandidate {
                element,
                level,
                raw_text,
                processed,
            })
        })
        .collect()
}

/// When one match encloses another (a container class and the heading tag
/// inside it), keep only the inner element: it is the one holding the text.
fn drop_enclosing<D: HostDom + ?Sized>(dom: &D, nodes: Vec<D::Node>) -> Vec<D::Node> {
    let keep: Vec<bool> = nodes
        .iter()
        .map(|outer| {
            !nodes
                .iter()
                .any(|inner| inner != outer && dom.contains(outer, inner))
        })
        .collect();
    nodes
        .into_iter()
        .zip(keep)
        .filter_map(|(node, keep)| keep.then_some(node))
        .collect()
}

/// Heading text with any overlay marker text removed.
fn visible_text<D: HostDom + ?Sized>(dom: &D, element: &D::Node, config: &CompiledConfig) -> String {
    let text = dom.text_content(element);
    if config.strategy() != ApplyStrategy::OverlayMarker {
        return text;
    }
    match dom.query_first(Some(element), &config.marker_selector) {
        Ok(Some(marker)) => {
            let marker_text = dom.text_content(&marker);
            text.strip_prefix(marker_text.as_str())
                .map(str::to_string)
                .unwrap_or(text)
        }
        _ => text,
    }
}
