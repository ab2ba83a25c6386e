//! The live-DOM contract the numbering engine is written against.
//!
//! The engine never talks to a browser directly. Everything it needs from the
//! host page (structural queries, text access, computed font size, document
//! order, mutation observation and the edit signals that make the host persist
//! a change) goes through [`HostDom`]. Two implementations exist:
//!
//! - [`MemoryDom`]: an arena-backed tree, used by the test-suite and by native
//!   hosts that want to number a parsed document.
//! - `WebDom` in `secnum-wasm`: a thin adapter over `web-sys`.
//!
//! Structural queries are expressed as [`Selector`]s, a parsed subset of CSS
//! selectors. Browser hosts hand the original source text to
//! `querySelectorAll`; [`MemoryDom`] evaluates the parsed form itself.

pub mod error;
pub mod host;
pub mod memory;
pub mod selector;

pub use error::{DomError, SelectorError};
pub use host::{HostDom, MarkerSpec, MutationRecord, ObserveOptions};
pub use memory::{EditSignal, MemoryDom, NodeId, SignalKind};
pub use selector::{Selector, parse_selector};
