//! WebAssembly bindings for secnum heading numbering.
//!
//! This crate runs the numbering engine inside a browser extension's content
//! script. The engine itself is platform-agnostic; this crate supplies the
//! browser half:
//!
//! - [`dom`] - `WebDom`, the `HostDom` implementation over `web-sys`,
//!   including the `MutationObserver` bridge
//! - [`controller`] - `AutoNumbering`, the object the page script drives
//! - [`error`] - error types with JavaScript interop
//! - [`types`] - TypeScript-friendly presets and strategies
//!
//! # Example
//!
//! ```javascript
//! import init, { AutoNumbering, Preset } from '@secnum/wasm';
//!
//! await init();
//!
//! const numbering = AutoNumbering.withPreset(Preset.Notion);
//! window.addEventListener('load', () => numbering.initialize(true));
//! ```
//!
//! # Threading
//!
//! Everything runs on the page's UI thread. Mutation batches and the
//! debounce timeout are the only re-entry points, and both are delivered
//! between script turns.

mod controller;
mod dom;
mod error;
mod types;

pub use controller::AutoNumbering;
pub use dom::WebDom;
pub use error::{ErrorCode, SecnumError};
pub use types::{Preset, Strategy};

use wasm_bindgen::prelude::*;

/// Initialize the WASM module.
///
/// Installs the panic hook and, with the `console-logging` feature, routes
/// `log` output to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    #[cfg(feature = "console-logging")]
    {
        console_log::init_with_level(log::Level::Debug).ok();
    }
}

/// Get the version of the secnum-wasm library.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
