//! Decides whether a mutation record could change the numbering.
//!
//! Over-inclusive: a false positive is one extra idempotent pass, a false
//! negative leaves stale numbers on the page.

use crate::classifier::{heading_tag_level, is_heading_like};
use crate::config::CompiledConfig;
use log::trace;
use secnum_dom::{HostDom, MutationRecord};

pub fn is_relevant<D: HostDom + ?Sized>(
    dom: &D,
    record: &MutationRecord<D::Node>,
    config: &CompiledConfig,
) -> bool {
    let relevant = match record {
        MutationRecord::CharacterData { target } => within_heading(dom, target),
        MutationRecord::ChildList {
            target,
            added,
            removed,
        } => {
            within_heading(dom, target)
                || added.iter().any(|n| added_heading(dom, n, config))
                || removed.iter().any(|n| removed_heading(dom, n, config))
        }
    };
    trace!("Mutation on {:?} relevant: {}", record.target(), relevant);
    relevant
}

/// True if any record in the batch is relevant.
pub fn batch_is_relevant<D: HostDom + ?Sized>(
    dom: &D,
    records: &[MutationRecord<D::Node>],
    config: &CompiledConfig,
) -> bool {
    records.iter().any(|r| is_relevant(dom, r, config))
}

/// `node` or one of its ancestors is heading-like.
fn within_heading<D: HostDom + ?Sized>(dom: &D, node: &D::Node) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if is_heading_like(dom, &n) {
            return true;
        }
        current = dom.parent(&n);
    }
    false
}

fn added_heading<D: HostDom + ?Sized>(dom: &D, node: &D::Node, config: &CompiledConfig) -> bool {
    if !dom.is_element(node) {
        return false;
    }
    is_heading_like(dom, node) || contains_heading(dom, node, config)
}

/// A removed subtree is detached but still readable, so its descendants are
/// probed the same way as an added one.
fn removed_heading<D: HostDom + ?Sized>(dom: &D, node: &D::Node, config: &CompiledConfig) -> bool {
    if !dom.is_element(node) {
        return false;
    }
    dom.tag_name(node)
        .as_deref()
        .and_then(heading_tag_level)
        .is_some()
        || dom
            .class_list(node)
            .iter()
            .any(|c| c.contains("heading") || c.contains("header"))
        || contains_heading(dom, node, config)
}

fn contains_heading<D: HostDom + ?Sized>(dom: &D, node: &D::Node, config: &CompiledConfig) -> bool {
    dom.query_first(Some(node), &config.heading_probe)
        .ok()
        .flatten()
        .is_some()
}
