//! An in-memory, arena-backed implementation of [`HostDom`].
//!
//! Nodes are never freed: a removed subtree stays in the arena, detached, so
//! mutation records can still describe it (the same way a browser keeps a
//! removed node alive while a `MutationRecord` references it).

use crate::error::DomError;
use crate::host::{HostDom, MarkerSpec, MutationRecord, ObserveOptions};
use crate::selector::Selector;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Focus,
    Input,
    Change,
    Blur,
}

/// A synthetic event that was dispatched on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSignal {
    pub node: NodeId,
    pub kind: SignalKind,
}

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        font_size: Option<f32>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    root: NodeId,
    options: ObserveOptions,
}

#[derive(Debug)]
pub struct MemoryDom {
    nodes: Vec<NodeEntry>,
    document: NodeId,
    body: NodeId,
    loaded: bool,
    observation: Option<Observation>,
    records: Vec<MutationRecord<NodeId>>,
    signals: Vec<EditSignal>,
    read_only: HashSet<NodeId>,
    refuse_observe: HashSet<NodeId>,
    failing_queries: HashSet<String>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Creates a loaded document with `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: vec![NodeEntry {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            document: NodeId(0),
            body: NodeId(0),
            loaded: true,
            observation: None,
            records: Vec::new(),
            signals: Vec::new(),
            read_only: HashSet::new(),
            refuse_observe: HashSet::new(),
            failing_queries: HashSet::new(),
        };
        let html = dom.create_element("html");
        dom.attach(dom.document, html, None);
        let body = dom.create_element("body");
        dom.attach(html, body, None);
        dom.body = body;
        dom
    }

    pub fn document_id(&self) -> NodeId {
        self.document
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            font_size: None,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Creates an element with attributes and appends it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        for (name, value) in attrs {
            self.write_attribute(id, name, value);
        }
        self.append(parent, id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append(parent, id);
        id
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Inserts `child` before `reference` (or at the end), detaching it from
    /// any previous parent first.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.nodes[child.0].parent.is_some() {
            self.remove(child);
        }
        self.attach(parent, child, reference);
        self.record_child_list(parent, vec![child], Vec::new());
    }

    /// Detaches `node` from its parent. The node and its subtree stay readable.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.record_child_list(parent, Vec::new(), vec![node]);
    }

    /// Replaces the data of a text node, like a user typing.
    pub fn set_text(&mut self, text_node: NodeId, text: &str) {
        if let NodeData::Text(data) = &mut self.nodes[text_node.0].data {
            *data = text.to_string();
            self.record_character_data(text_node);
        }
    }

    pub fn set_font_size(&mut self, node: NodeId, px: f32) {
        if let NodeData::Element { font_size, .. } = &mut self.nodes[node.0].data {
            *font_size = Some(px);
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Makes every write to `node` fail, to exercise per-heading error paths.
    pub fn make_read_only(&mut self, node: NodeId) {
        self.read_only.insert(node);
    }

    /// Makes `observe` fail for `root`.
    pub fn refuse_observation(&mut self, root: NodeId) {
        self.refuse_observe.insert(root);
    }

    /// Makes every query with this selector source text fail.
    pub fn fail_query(&mut self, source: &str) {
        self.failing_queries.insert(source.to_string());
    }

    pub fn observed_root(&self) -> Option<NodeId> {
        self.observation.map(|o| o.root)
    }

    pub fn signals(&self) -> &[EditSignal] {
        &self.signals
    }

    pub fn clear_signals(&mut self) {
        self.signals.clear();
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(&self.document, &node)
    }

    // --- internals ---

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let siblings = &mut self.nodes[parent.0].children;
        let index = reference
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn write_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[node.0].data {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn observes(&self, target: NodeId) -> Option<ObserveOptions> {
        let obs = self.observation?;
        self.contains(&obs.root, &target).then_some(obs.options)
    }

    fn record_child_list(&mut self, target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) {
        if self.observes(target).is_some_and(|o| o.child_list) {
            self.records.push(MutationRecord::ChildList {
                target,
                added,
                removed,
            });
        }
    }

    fn record_character_data(&mut self, target: NodeId) {
        if self.observes(target).is_some_and(|o| o.character_data) {
            self.records.push(MutationRecord::CharacterData { target });
        }
    }

    fn check_writable(&self, node: NodeId) -> Result<(), DomError> {
        if self.read_only.contains(&node) {
            return Err(DomError::WriteFailed(format!("{:?} is read-only", node)));
        }
        if !self.is_connected(node) {
            return Err(DomError::Detached);
        }
        Ok(())
    }

    /// Child indices from the document root down to `node`, plus the id of
    /// the root the path starts from.
    fn path(&self, node: NodeId) -> (NodeId, Vec<usize>) {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            let index = self.nodes[parent.0]
                .children
                .iter()
                .position(|c| *c == current)
                .unwrap_or(0);
            path.push(index);
            current = parent;
        }
        path.reverse();
        (current, path)
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => out.push_str(text),
            _ => {
                for child in &self.nodes[node.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }
}

impl HostDom for MemoryDom {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn query_all(
        &self,
        scope: Option<&NodeId>,
        selector: &Selector,
    ) -> Result<Vec<NodeId>, DomError> {
        if self.failing_queries.contains(selector.source()) {
            return Err(DomError::QueryFailed {
                selector: selector.source().to_string(),
                message: "query refused".to_string(),
            });
        }
        let start = scope.copied().unwrap_or(self.document);
        let mut results = Vec::new();
        // Pre-order walk, scope itself excluded.
        let mut stack: Vec<NodeId> = self.nodes[start.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if selector.matches(self, &current) {
                results.push(current);
            }
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        Ok(results)
    }

    fn is_element(&self, node: &NodeId) -> bool {
        matches!(self.nodes[node.0].data, NodeData::Element { .. })
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    fn class_list(&self, node: &NodeId) -> Vec<String> {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn text_content(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.collect_text(*node, &mut out);
        out
    }

    fn font_size_px(&self, node: &NodeId) -> Option<f32> {
        match &self.nodes[node.0].data {
            NodeData::Element { font_size, .. } => *font_size,
            _ => None,
        }
    }

    fn compare_position(&self, a: &NodeId, b: &NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let (root_a, path_a) = self.path(*a);
        let (root_b, path_b) = self.path(*b);
        if root_a != root_b {
            // Disconnected trees have no defined order; keep it stable.
            return root_a.cmp(&root_b);
        }
        path_a.cmp(&path_b)
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) -> Result<(), DomError> {
        self.check_writable(*node)?;
        let removed = std::mem::take(&mut self.nodes[node.0].children);
        for child in &removed {
            self.nodes[child.0].parent = None;
        }
        let text_node = self.create_text(text);
        self.attach(*node, text_node, None);
        self.record_child_list(*node, vec![text_node], removed);
        Ok(())
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.check_writable(*node)?;
        if !self.is_element(node) {
            return Err(DomError::NotAnElement);
        }
        self.write_attribute(*node, name, value);
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), DomError> {
        self.check_writable(*node)?;
        if let NodeData::Element { attributes, .. } = &mut self.nodes[node.0].data {
            attributes.retain(|(n, _)| n != name);
            Ok(())
        } else {
            Err(DomError::NotAnElement)
        }
    }

    fn insert_marker(&mut self, parent: &NodeId, spec: &MarkerSpec<'_>) -> Result<NodeId, DomError> {
        self.check_writable(*parent)?;
        let marker = self.create_element(spec.tag);
        self.write_attribute(marker, "class", spec.class);
        if let Some(style) = spec.style {
            self.write_attribute(marker, "style", style);
        }
        let text = self.create_text(spec.text);
        self.attach(marker, text, None);
        let first = self.nodes[parent.0].children.first().copied();
        self.insert_before(*parent, marker, first);
        Ok(marker)
    }

    fn remove_node(&mut self, node: &NodeId) -> Result<(), DomError> {
        self.check_writable(*node)?;
        self.remove(*node);
        Ok(())
    }

    fn dispatch_edit_signals(&mut self, node: &NodeId) -> Result<(), DomError> {
        self.check_writable(*node)?;
        for kind in [
            SignalKind::Focus,
            SignalKind::Input,
            SignalKind::Change,
            SignalKind::Blur,
        ] {
            self.signals.push(EditSignal { node: *node, kind });
        }
        Ok(())
    }

    fn observe(&mut self, root: &NodeId, options: ObserveOptions) -> Result<(), DomError> {
        if self.refuse_observe.contains(root) {
            return Err(DomError::ObserveFailed(format!(
                "observation refused for {:?}",
                root
            )));
        }
        self.observation = Some(Observation {
            root: *root,
            options,
        });
        Ok(())
    }

    fn disconnect(&mut self) {
        self.observation = None;
        self.records.clear();
    }

    fn take_records(&mut self) -> Vec<MutationRecord<NodeId>> {
        std::mem::take(&mut self.records)
    }
}
