//! The page-script entry point.
//!
//! `AutoNumbering` owns one engine session. Mutation batches arrive through
//! the `WebDom` listener and are pumped into the engine; the watcher's
//! deadline is mirrored into a single `setTimeout` slot that is cleared and
//! re-armed whenever the deadline moves.

use crate::dom::WebDom;
use crate::error::SecnumError;
use crate::types::{Preset, Strategy};
use log::{debug, error, warn};
use secnum_dom::HostDom;
use secnum_engine::{Command, NumberingConfig, NumberingEngine};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

struct ArmedTimer {
    handle: i32,
    deadline: Duration,
}

struct Session {
    engine: NumberingEngine<WebDom>,
    /// `Date.now()` at session start; engine time is measured from here.
    epoch: f64,
    timer: Option<ArmedTimer>,
    wake: Option<js_sys::Function>,
}

impl Session {
    fn now(&self) -> Duration {
        Duration::from_secs_f64((js_sys::Date::now() - self.epoch).max(0.0) / 1000.0)
    }

    /// Mirrors the engine's pending deadline into the timeout slot.
    fn sync_timer(&mut self) {
        let wanted = self.engine.next_deadline();
        if wanted == self.timer.as_ref().map(|t| t.deadline) {
            return;
        }
        let window = self.engine.dom().window().clone();
        if let Some(timer) = self.timer.take() {
            window.clear_timeout_with_handle(timer.handle);
        }
        let (Some(deadline), Some(wake)) = (wanted, self.wake.as_ref()) else {
            return;
        };
        let delay = deadline.saturating_sub(self.now()).as_millis();
        let delay = i32::try_from(delay).unwrap_or(i32::MAX);
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(wake, delay) {
            Ok(handle) => self.timer = Some(ArmedTimer { handle, deadline }),
            Err(e) => error!("Could not arm numbering timer: {:?}", e),
        }
    }

    fn on_mutations(&mut self) {
        let now = self.now();
        if let Some(outcome) = self.engine.pump(now) {
            debug!("Mutation batch: {:?}", outcome);
        }
        self.sync_timer();
    }

    fn on_timer(&mut self) {
        self.timer = None;
        let now = self.now();
        if let Some(report) = self.engine.tick(now) {
            debug!("Scheduled pass: {}", report);
        }
        self.sync_timer();
    }
}

fn with_session(weak: &Weak<RefCell<Session>>, f: impl FnOnce(&mut Session)) {
    let Some(session) = weak.upgrade() else {
        return;
    };
    match session.try_borrow_mut() {
        Ok(mut session) => f(&mut session),
        Err(_) => warn!("Numbering session busy, callback skipped"),
    };
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| SecnumError::from(e).into())
}

/// Automatic heading numbering for the current page.
///
/// # Example
///
/// ```javascript
/// const numbering = AutoNumbering.withPreset(Preset.Notion);
/// const { autoNumbering } = await chrome.storage.sync.get('autoNumbering');
/// numbering.initialize(Boolean(autoNumbering));
///
/// chrome.runtime.onMessage.addListener((message, _sender, sendResponse) => {
///   sendResponse(numbering.handleMessage(message));
/// });
/// ```
#[wasm_bindgen]
pub struct AutoNumbering {
    session: Rc<RefCell<Session>>,
    _wake: Closure<dyn FnMut()>,
}

#[wasm_bindgen]
impl AutoNumbering {
    /// Create a controller from a configuration object.
    ///
    /// `undefined` or `null` selects the Notion preset; an object is read as
    /// a full configuration with unspecified keys at their generic defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<AutoNumbering, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            NumberingConfig::notion()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(SecnumError::from)?
        };
        Self::build(config)
    }

    #[wasm_bindgen(js_name = withPreset)]
    pub fn with_preset(preset: Preset, strategy: Option<Strategy>) -> Result<AutoNumbering, JsValue> {
        let mut config = NumberingConfig::from(preset);
        if let Some(strategy) = strategy {
            config.strategy = strategy.into();
        }
        Self::build(config)
    }

    /// Start the session with the stored preference. Returns the pass
    /// report when numbering ran, otherwise `undefined`.
    pub fn initialize(&self, enabled: bool) -> Result<JsValue, JsValue> {
        let report = self.session.borrow_mut().engine.initialize_with(enabled);
        to_js(&report)
    }

    /// Handle a popup message and return its acknowledgement.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue) -> Result<JsValue, JsValue> {
        let command: Command = serde_wasm_bindgen::from_value(message)
            .map_err(|e| SecnumError::command(format!("Invalid message: {}", e)))?;
        let mut session = self.session.borrow_mut();
        let response = session.engine.handle_command(command);
        session.sync_timer();
        to_js(&response)
    }

    #[wasm_bindgen(js_name = setEnabled)]
    pub fn set_enabled(&self, enabled: bool) -> Result<JsValue, JsValue> {
        let mut session = self.session.borrow_mut();
        let report = session.engine.set_enabled(enabled);
        session.sync_timer();
        to_js(&report)
    }

    #[wasm_bindgen(js_name = applyOnce)]
    pub fn apply_once(&self) -> Result<JsValue, JsValue> {
        let report = self.session.borrow_mut().engine.apply_once();
        to_js(&report)
    }

    #[wasm_bindgen(js_name = removeOnce)]
    pub fn remove_once(&self) -> u32 {
        let removed = self.session.borrow_mut().engine.remove_once();
        u32::try_from(removed).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self) -> bool {
        self.session.borrow().engine.is_enabled()
    }

    #[wasm_bindgen(js_name = isWatching)]
    pub fn is_watching(&self) -> bool {
        self.session.borrow().engine.is_watching()
    }

    /// Watcher counters, or `undefined` without a live subscription.
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.borrow().engine.watcher_stats())
    }

    #[wasm_bindgen(js_name = structureReport)]
    pub fn structure_report(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.borrow().engine.structure_report())
    }
}

impl AutoNumbering {
    fn build(config: NumberingConfig) -> Result<AutoNumbering, JsValue> {
        let dom = WebDom::from_global().map_err(SecnumError::from)?;
        let engine = NumberingEngine::new(dom, config).map_err(SecnumError::from)?;
        let session = Rc::new(RefCell::new(Session {
            engine,
            epoch: js_sys::Date::now(),
            timer: None,
            wake: None,
        }));

        let weak = Rc::downgrade(&session);
        let wake = Closure::<dyn FnMut()>::new(move || with_session(&weak, Session::on_timer));

        {
            let mut s = session.borrow_mut();
            s.wake = Some(wake.as_ref().unchecked_ref::<js_sys::Function>().clone());
            let weak = Rc::downgrade(&session);
            s.engine
                .dom()
                .set_listener(move || with_session(&weak, Session::on_mutations));
        }

        Ok(AutoNumbering {
            session,
            _wake: wake,
        })
    }
}

impl Drop for AutoNumbering {
    fn drop(&mut self) {
        if let Ok(mut session) = self.session.try_borrow_mut() {
            if let Some(timer) = session.timer.take() {
                session.engine.dom().window().clear_timeout_with_handle(timer.handle);
            }
            session.wake = None;
            session.engine.dom().set_listener(|| {});
            session.engine.dom_mut().disconnect();
        }
    }
}
