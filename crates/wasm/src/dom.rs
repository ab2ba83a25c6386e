//! `HostDom` over the browser DOM.
//!
//! Queries go straight to `querySelectorAll` with the selector's source
//! text. Mutation records from the `MutationObserver` are buffered in a
//! shared queue; the observer callback then pokes a listener so the
//! controller can pump the engine.

use secnum_dom::{DomError, HostDom, MarkerSpec, MutationRecord, ObserveOptions, Selector};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, EventInit, HtmlElement, InputEvent, InputEventInit, MutationObserver,
    MutationObserverInit, Node, NodeList, Window,
};

type RecordQueue = Rc<RefCell<Vec<MutationRecord<Node>>>>;
type Listener = Rc<RefCell<Option<Box<dyn Fn()>>>>;

struct Observation {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

pub struct WebDom {
    window: Window,
    document: Document,
    observation: Option<Observation>,
    queue: RecordQueue,
    listener: Listener,
}

impl fmt::Debug for WebDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDom")
            .field("observing", &self.observation.is_some())
            .field("queued", &self.queue.borrow().len())
            .finish()
    }
}

impl WebDom {
    pub fn new(window: Window, document: Document) -> Self {
        Self {
            window,
            document,
            observation: None,
            queue: Rc::new(RefCell::new(Vec::new())),
            listener: Rc::new(RefCell::new(None)),
        }
    }

    /// The page's own window and document.
    pub fn from_global() -> Result<Self, DomError> {
        let window = web_sys::window().ok_or(DomError::Detached)?;
        let document = window.document().ok_or(DomError::Detached)?;
        Ok(Self::new(window, document))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Called after every delivered mutation batch, once the records are
    /// queued.
    pub fn set_listener(&self, listener: impl Fn() + 'static) {
        *self.listener.borrow_mut() = Some(Box::new(listener));
    }

    fn element<'n>(&self, node: &'n Node) -> Option<&'n Element> {
        node.dyn_ref::<Element>()
    }
}

fn node_list(list: &NodeList) -> Vec<Node> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}

fn js_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn convert_record(record: &web_sys::MutationRecord) -> Option<MutationRecord<Node>> {
    let target = record.target()?;
    match record.type_().as_str() {
        "childList" => Some(MutationRecord::ChildList {
            target,
            added: node_list(&record.added_nodes()),
            removed: node_list(&record.removed_nodes()),
        }),
        "characterData" => Some(MutationRecord::CharacterData { target }),
        _ => None,
    }
}

fn convert_batch(records: &js_sys::Array) -> Vec<MutationRecord<Node>> {
    records
        .iter()
        .filter_map(|r| r.dyn_into::<web_sys::MutationRecord>().ok())
        .filter_map(|r| convert_record(&r))
        .collect()
}

impl HostDom for WebDom {
    type Node = Node;

    fn body(&self) -> Option<Node> {
        self.document.body().map(Node::from)
    }

    fn query_all(&self, scope: Option<&Node>, selector: &Selector) -> Result<Vec<Node>, DomError> {
        let failed = |e: JsValue| DomError::QueryFailed {
            selector: selector.source().to_string(),
            message: js_message(&e),
        };
        let list = match scope {
            None => self.document.query_selector_all(selector.source()),
            Some(node) => match self.element(node) {
                Some(element) => element.query_selector_all(selector.source()),
                None => return Err(DomError::NotAnElement),
            },
        }
        .map_err(failed)?;
        Ok(node_list(&list))
    }

    fn is_element(&self, node: &Node) -> bool {
        node.node_type() == Node::ELEMENT_NODE
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        self.element(node).map(|e| e.tag_name().to_ascii_lowercase())
    }

    fn class_list(&self, node: &Node) -> Vec<String> {
        self.element(node)
            .and_then(|e| e.get_attribute("class"))
            .map(|classes| classes.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        self.element(node)?.get_attribute(name)
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn contains(&self, ancestor: &Node, node: &Node) -> bool {
        ancestor.contains(Some(node))
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn font_size_px(&self, node: &Node) -> Option<f32> {
        let element = self.element(node)?;
        let style = self.window.get_computed_style(element).ok()??;
        let value = style.get_property_value("font-size").ok()?;
        value.trim().trim_end_matches("px").parse().ok()
    }

    fn compare_position(&self, a: &Node, b: &Node) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let position = a.compare_document_position(b);
        if position & Node::DOCUMENT_POSITION_FOLLOWING != 0 {
            Ordering::Less
        } else if position & Node::DOCUMENT_POSITION_PRECEDING != 0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    fn is_loaded(&self) -> bool {
        js_sys::Reflect::get(&self.document, &JsValue::from_str("readyState"))
            .ok()
            .and_then(|state| state.as_string())
            .is_some_and(|state| state == "complete")
    }

    fn set_text_content(&mut self, node: &Node, text: &str) -> Result<(), DomError> {
        if !node.is_connected() {
            return Err(DomError::Detached);
        }
        node.set_text_content(Some(text));
        Ok(())
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), DomError> {
        self.element(node)
            .ok_or(DomError::NotAnElement)?
            .set_attribute(name, value)
            .map_err(|e| DomError::WriteFailed(js_message(&e)))
    }

    fn remove_attribute(&mut self, node: &Node, name: &str) -> Result<(), DomError> {
        self.element(node)
            .ok_or(DomError::NotAnElement)?
            .remove_attribute(name)
            .map_err(|e| DomError::WriteFailed(js_message(&e)))
    }

    fn insert_marker(&mut self, parent: &Node, spec: &MarkerSpec<'_>) -> Result<Node, DomError> {
        if !parent.is_connected() {
            return Err(DomError::Detached);
        }
        let write = |e: JsValue| DomError::WriteFailed(js_message(&e));
        let marker = self.document.create_element(spec.tag).map_err(write)?;
        marker.set_class_name(spec.class);
        if let Some(style) = spec.style {
            marker.set_attribute("style", style).map_err(write)?;
        }
        marker.set_attribute("contenteditable", "false").map_err(write)?;
        marker.set_text_content(Some(spec.text));
        parent
            .insert_before(&marker, parent.first_child().as_ref())
            .map_err(write)
    }

    fn remove_node(&mut self, node: &Node) -> Result<(), DomError> {
        let Some(parent) = node.parent_node() else {
            return Ok(());
        };
        parent
            .remove_child(node)
            .map(|_| ())
            .map_err(|e| DomError::WriteFailed(js_message(&e)))
    }

    fn dispatch_edit_signals(&mut self, node: &Node) -> Result<(), DomError> {
        let element = node
            .dyn_ref::<HtmlElement>()
            .ok_or(DomError::NotAnElement)?;
        let failed = |e: JsValue| DomError::DispatchFailed(js_message(&e));

        element.focus().map_err(failed)?;

        let input_init = InputEventInit::new();
        input_init.set_bubbles(true);
        input_init.set_cancelable(true);
        js_sys::Reflect::set(
            &input_init,
            &JsValue::from_str("inputType"),
            &JsValue::from_str("insertText"),
        )
        .map_err(failed)?;
        let input = InputEvent::new_with_event_init_dict("input", &input_init).map_err(failed)?;
        element.dispatch_event(&input).map_err(failed)?;

        let change_init = EventInit::new();
        change_init.set_bubbles(true);
        change_init.set_cancelable(true);
        let change = Event::new_with_event_init_dict("change", &change_init).map_err(failed)?;
        element.dispatch_event(&change).map_err(failed)?;

        element.blur().map_err(failed)
    }

    fn observe(&mut self, root: &Node, options: ObserveOptions) -> Result<(), DomError> {
        self.disconnect();

        let queue = Rc::clone(&self.queue);
        let listener = Rc::clone(&self.listener);
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                queue.borrow_mut().extend(convert_batch(&records));
                if let Some(listener) = listener.borrow().as_ref() {
                    listener();
                }
            },
        );

        let failed = |e: JsValue| DomError::ObserveFailed(js_message(&e));
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(failed)?;
        let init = MutationObserverInit::new();
        init.set_child_list(options.child_list);
        init.set_character_data(options.character_data);
        init.set_subtree(true);
        observer.observe_with_options(root, &init).map_err(failed)?;

        self.observation = Some(Observation {
            observer,
            _callback: callback,
        });
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(observation) = self.observation.take() {
            observation.observer.disconnect();
        }
        self.queue.borrow_mut().clear();
    }

    fn take_records(&mut self) -> Vec<MutationRecord<Node>> {
        let mut records = std::mem::take(&mut *self.queue.borrow_mut());
        if let Some(observation) = &self.observation {
            records.extend(convert_batch(&observation.observer.take_records()));
        }
        records
    }
}
