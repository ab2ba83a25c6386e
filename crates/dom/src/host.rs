//! Defines the core abstraction for a live, mutable host document.
use crate::error::DomError;
use crate::selector::Selector;
use std::cmp::Ordering;
use std::fmt::Debug;

/// A batch entry delivered by the host's mutation observation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationRecord<N> {
    /// Children of `target` were added and/or removed.
    ChildList {
        target: N,
        added: Vec<N>,
        removed: Vec<N>,
    },
    /// The data of the text node `target` changed.
    CharacterData { target: N },
}

impl<N> MutationRecord<N> {
    pub fn target(&self) -> &N {
        match self {
            MutationRecord::ChildList { target, .. } => target,
            MutationRecord::CharacterData { target } => target,
        }
    }
}

/// What a mutation subscription reports. Always subtree-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub character_data: bool,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            child_list: true,
            character_data: false,
        }
    }
}

/// Description of a non-content marker element to insert as a first child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSpec<'s> {
    pub tag: &'s str,
    pub class: &'s str,
    pub text: &'s str,
    pub style: Option<&'s str>,
}

/// The universal contract for the document the engine numbers.
///
/// `Node` is a handle to a live node; the engine never owns or copies the
/// node itself, it only reads and mutates it in place through this trait.
/// Read operations are infallible where the DOM itself cannot fail (a
/// detached node still has a tag name), and write operations report
/// [`DomError`] so one bad heading never aborts a pass.
pub trait HostDom {
    type Node: Clone + PartialEq + Debug;

    /// The document body, the fallback observation root.
    fn body(&self) -> Option<Self::Node>;

    /// All elements below `scope` (or the whole document) matching `selector`,
    /// in document order.
    fn query_all(
        &self,
        scope: Option<&Self::Node>,
        selector: &Selector,
    ) -> Result<Vec<Self::Node>, DomError>;

    fn query_first(
        &self,
        scope: Option<&Self::Node>,
        selector: &Selector,
    ) -> Result<Option<Self::Node>, DomError> {
        Ok(self.query_all(scope, selector)?.into_iter().next())
    }

    fn is_element(&self, node: &Self::Node) -> bool;

    /// Lower-cased tag name, `None` for non-element nodes.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn class_list(&self, node: &Self::Node) -> Vec<String>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Inclusive containment: a node contains itself.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if &n == ancestor {
                return true;
            }
            current = self.parent(&n);
        }
        false
    }

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Effective font size in CSS pixels, if the host can compute it.
    fn font_size_px(&self, node: &Self::Node) -> Option<f32>;

    /// Relative document position of two nodes.
    fn compare_position(&self, a: &Self::Node, b: &Self::Node) -> Ordering;

    /// Whether the host document has finished loading.
    fn is_loaded(&self) -> bool;

    /// Replaces all children of `node` with a single text node.
    fn set_text_content(&mut self, node: &Self::Node, text: &str) -> Result<(), DomError>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str)
    -> Result<(), DomError>;

    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), DomError>;

    /// Inserts a marker element as the first child of `parent`.
    fn insert_marker(
        &mut self,
        parent: &Self::Node,
        spec: &MarkerSpec<'_>,
    ) -> Result<Self::Node, DomError>;

    fn remove_node(&mut self, node: &Self::Node) -> Result<(), DomError>;

    /// Fires focus, `input`, `change` and blur on `node` so the host page's
    /// own save pipeline picks up a programmatic edit.
    fn dispatch_edit_signals(&mut self, node: &Self::Node) -> Result<(), DomError>;

    /// Starts (or replaces) the single mutation subscription.
    fn observe(&mut self, root: &Self::Node, options: ObserveOptions) -> Result<(), DomError>;

    fn disconnect(&mut self);

    /// Drains mutation records queued since the last call.
    fn take_records(&mut self) -> Vec<MutationRecord<Self::Node>>;
}
