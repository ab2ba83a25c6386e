//! Puts canonical prefixes on the page, or takes them off again.
//!
//! Both strategies skip the write entirely when the page already shows the
//! canonical prefix, which keeps a second pass over an unchanged document
//! free of writes and free of redundant host-side saves.

use crate::collector::HeadingCandidate;
use crate::config::{ApplyStrategy, CompiledConfig};
use crate::error::ApplyError;
use crate::numbering::NumberedHeading;
use crate::prefix::split_prefix;
use log::{debug, trace, warn};
use secnum_dom::{HostDom, MarkerSpec};

const MARKER_TAG: &str = "span";
const MARKER_STYLE: &str = "font: inherit; color: inherit; user-select: none;";

/// Applies one [`ApplyStrategy`] consistently for an engine's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Applicator<'c> {
    config: &'c CompiledConfig,
}

impl<'c> Applicator<'c> {
    pub fn new(config: &'c CompiledConfig) -> Self {
        Self { config }
    }

    /// Makes `heading` show its canonical prefix. Returns whether anything
    /// was written.
    pub fn apply<D: HostDom + ?Sized>(
        &self,
        dom: &mut D,
        heading: &NumberedHeading<D::Node>,
    ) -> Result<bool, ApplyError> {
        match self.config.strategy() {
            ApplyStrategy::ContentRewrite => self.rewrite_content(dom, heading),
            ApplyStrategy::OverlayMarker => self.place_marker(dom, heading),
        }
    }

    fn rewrite_content<D: HostDom + ?Sized>(
        &self,
        dom: &mut D,
        heading: &NumberedHeading<D::Node>,
    ) -> Result<bool, ApplyError> {
        let element = &heading.candidate.element;
        let text = heading.candidate.raw_text.trim_start();
        let (existing, title) = match split_prefix(text) {
            Some((prefix, rest)) => (Some(prefix), rest),
            None => (None, text),
        };
        if existing.as_ref() == Some(&heading.prefix) {
            return Ok(false);
        }

        let canonical = heading.prefix.to_string();
        let updated = format!("{} {}", canonical, title);
        dom.set_text_content(element, &updated)
            .map_err(|source| ApplyError::Write {
                prefix: canonical.clone(),
                source,
            })?;
        dom.dispatch_edit_signals(element)
            .map_err(ApplyError::Signals)?;
        debug!(
            "Numbered heading: '{}' -> '{}'",
            heading.candidate.raw_text, updated
        );
        Ok(true)
    }

    fn place_marker<D: HostDom + ?Sized>(
        &self,
        dom: &mut D,
        heading: &NumberedHeading<D::Node>,
    ) -> Result<bool, ApplyError> {
        let settings = &self.config.settings;
        let element = &heading.candidate.element;
        let canonical = heading.prefix.to_string();
        let label = format!("{} ", canonical);

        let marker = dom.query_first(Some(element), &self.config.marker_selector)?;
        let marker_current = marker
            .as_ref()
            .is_some_and(|m| dom.text_content(m) == label);
        if marker_current && heading.candidate.processed.as_deref() == Some(canonical.as_str()) {
            return Ok(false);
        }

        let write = |source| ApplyError::Write {
            prefix: canonical.clone(),
            source,
        };
        match marker {
            Some(m) if !marker_current => dom.set_text_content(&m, &label).map_err(write)?,
            Some(_) => {}
            None => {
                dom.insert_marker(
                    element,
                    &MarkerSpec {
                        tag: MARKER_TAG,
                        class: &settings.marker_class,
                        text: &label,
                        style: Some(MARKER_STYLE),
                    },
                )
                .map_err(write)?;
            }
        }
        dom.set_attribute(element, &settings.done_attribute, &canonical)
            .map_err(write)?;
        trace!("Marker set to '{}' for {:?}", canonical, element);
        Ok(true)
    }

    /// Takes a stale number off a candidate that gets no prefix this pass.
    /// Returns whether anything was written.
    ///
    /// Overlay markers and done attributes are always ours, so they go for
    /// every such candidate. Rewritten text cannot be told apart from text
    /// the user typed, so content is only touched when nothing but a prefix
    /// is left in it.
    pub fn clear<D: HostDom + ?Sized>(
        &self,
        dom: &mut D,
        candidate: &HeadingCandidate<D::Node>,
    ) -> Result<bool, ApplyError> {
        let element = &candidate.element;
        match self.config.strategy() {
            ApplyStrategy::OverlayMarker => {
                let marker = dom.query_first(Some(element), &self.config.marker_selector)?;
                if let Some(marker) = &marker {
                    dom.remove_node(marker)?;
                }
                let done = candidate.processed.is_some();
                if done {
                    dom.remove_attribute(element, &self.config.settings.done_attribute)?;
                }
                Ok(marker.is_some() || done)
            }
            ApplyStrategy::ContentRewrite => {
                let bare = split_prefix(&candidate.raw_text)
                    .is_some_and(|(_, title)| title.trim().is_empty());
                if !bare {
                    return Ok(false);
                }
                dom.set_text_content(element, "")?;
                dom.dispatch_edit_signals(element)
                    .map_err(ApplyError::Signals)?;
                debug!("Cleared bare number from '{}'", candidate.raw_text);
                Ok(true)
            }
        }
    }

    /// Takes numbering off the page. Returns how many headings changed.
    ///
    /// Overlay removal is exact: markers and done attributes go. Content
    /// removal strips a recognised dotted prefix from each candidate and
    /// fires the edit signals so the host saves the change. Per-heading
    /// failures are logged and skipped.
    pub fn remove<D: HostDom + ?Sized>(
        &self,
        dom: &mut D,
        candidates: &[HeadingCandidate<D::Node>],
    ) -> usize {
        let removed = match self.config.strategy() {
            ApplyStrategy::OverlayMarker => self.remove_markers(dom),
            ApplyStrategy::ContentRewrite => self.strip_content(dom, candidates),
        };
        self.remove_legacy_style(dom);
        removed
    }

    fn remove_markers<D: HostDom + ?Sized>(&self, dom: &mut D) -> usize {
        let done_attribute = &self.config.settings.done_attribute;
        let markers = dom
            .query_all(None, &self.config.marker_selector)
            .unwrap_or_else(|e| {
                warn!("Could not query numbering markers: {}", e);
                Vec::new()
            });
        for marker in &markers {
            if let Err(e) = dom.remove_node(marker) {
                warn!("Failed to remove marker {:?}: {}", marker, e);
            }
        }

        let numbered = dom
            .query_all(None, &self.config.done_selector)
            .unwrap_or_else(|e| {
                warn!("Could not query numbered headings: {}", e);
                Vec::new()
            });
        let mut cleared = 0;
        for heading in &numbered {
            match dom.remove_attribute(heading, done_attribute) {
                Ok(()) => cleared += 1,
                Err(e) => warn!("Failed to clear '{}' on {:?}: {}", done_attribute, heading, e),
            }
        }
        cleared.max(markers.len())
    }

    fn strip_content<D: HostDom + ?Sized>(
        &self,
        dom: &mut D,
        candidates: &[HeadingCandidate<D::Node>],
    ) -> usize {
        let mut stripped = 0;
        for candidate in candidates {
            let Some((_, title)) = split_prefix(&candidate.raw_text) else {
                continue;
            };
            let result = dom
                .set_text_content(&candidate.element, title)
                .and_then(|()| dom.dispatch_edit_signals(&candidate.element));
            match result {
                Ok(()) => stripped += 1,
                Err(e) => warn!(
                    "Failed to strip number from '{}': {}",
                    candidate.raw_text, e
                ),
            }
        }
        stripped
    }

    fn remove_legacy_style<D: HostDom + ?Sized>(&self, dom: &mut D) {
        let styles = dom
            .query_all(None, &self.config.legacy_style_selector)
            .unwrap_or_default();
        for style in &styles {
            match dom.remove_node(style) {
                Ok(()) => debug!("Removed legacy numbering stylesheet"),
                Err(e) => warn!("Failed to remove legacy numbering stylesheet: {}", e),
            }
        }
    }
}
