//! Resolves the hierarchy level of a heading element.
//!
//! Resolution walks the configured [`LevelResolver`] chain; the first
//! resolver that yields a level within `1..=max_level` wins, anything else
//! is level 0 ("not a heading"). The host's markup is not a stable contract,
//! which is why the chain ends with the font-size heuristic: it is the least
//! reliable link and the only one that forces style computation.

use crate::config::{LevelResolver, NumberingConfig};
use secnum_dom::HostDom;

pub fn classify<D: HostDom + ?Sized>(dom: &D, node: &D::Node, config: &NumberingConfig) -> u8 {
    if !dom.is_element(node) {
        return 0;
    }
    config
        .resolvers
        .iter()
        .find_map(|resolver| {
            resolver
                .resolve(dom, node, config)
                .filter(|level| (1..=config.max_level).contains(level))
        })
        .unwrap_or(0)
}

impl LevelResolver {
    pub fn resolve<D: HostDom + ?Sized>(
        self,
        dom: &D,
        node: &D::Node,
        config: &NumberingConfig,
    ) -> Option<u8> {
        match self {
            LevelResolver::TagName => dom.tag_name(node).as_deref().and_then(heading_tag_level),
            LevelResolver::ClassMarker => class_marker_level(dom, node, config),
            LevelResolver::FontSize => dom
                .font_size_px(node)
                .and_then(|px| config.font_thresholds.level_for(px)),
        }
    }
}

/// `h1`..`h6` to 1..6.
pub fn heading_tag_level(tag: &str) -> Option<u8> {
    let bytes = tag.as_bytes();
    match bytes {
        [b'h' | b'H', d @ b'1'..=b'6'] => Some(d - b'0'),
        _ => None,
    }
}

fn class_marker_level<D: HostDom + ?Sized>(
    dom: &D,
    node: &D::Node,
    config: &NumberingConfig,
) -> Option<u8> {
    let mut current = Some(node.clone());
    for _ in 0..=config.marker_ancestor_depth {
        let n = current?;
        let classes = dom.class_list(&n);
        if let Some(marker) = config
            .class_markers
            .iter()
            .find(|m| classes.iter().any(|c| *c == m.class))
        {
            return Some(marker.level);
        }
        current = dom.parent(&n);
    }
    None
}

/// Loose heading test used for mutation relevance: a heading tag, or a class
/// name that looks like a heading container.
pub fn is_heading_like<D: HostDom + ?Sized>(dom: &D, node: &D::Node) -> bool {
    if !dom.is_element(node) {
        return false;
    }
    if dom
        .tag_name(node)
        .as_deref()
        .and_then(heading_tag_level)
        .is_some()
    {
        return true;
    }
    dom.class_list(node).iter().any(|c| {
        c.contains("heading") || c.contains("header") || c.contains("title-block")
    })
}
