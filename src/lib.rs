//! Hierarchical heading numbering for live, structurally unstable documents.
//!
//! This crate re-exports the workspace's public API:
//!
//! - [`dom`] - the `HostDom` contract, selectors and the in-memory `MemoryDom`
//! - [`engine`] - classification, numbering, application and the watcher
//!
//! ```
//! use secnum::{HostDom, MemoryDom, NumberingConfig, NumberingEngine};
//!
//! let mut dom = MemoryDom::new();
//! let body = dom.body_id();
//! let h1 = dom.append_element(body, "h1", &[]);
//! dom.append_text(h1, "Introduction");
//!
//! let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();
//! engine.apply_once();
//! assert_eq!(engine.dom().text_content(&h1), "1. Introduction");
//! ```

pub use secnum_dom as dom;
pub use secnum_engine as engine;

pub use secnum_dom::{
    DomError, HostDom, MemoryDom, MutationRecord, NodeId, Selector, SelectorError, parse_selector,
};
pub use secnum_engine::{
    ApplyStrategy, Command, CommandResponse, CommandStatus, CompiledConfig, ConfigError,
    InMemoryPreferenceStore, LevelResolver, NumberingConfig, NumberingEngine, NumberingError,
    PassReport, PreferenceStore, Prefix, StructureReport, WatchOutcome, WatcherStats,
};

use log::debug;

/// Builds an engine from a JSON configuration document. Keys that are not
/// present keep their defaults.
pub fn engine_from_json<D: HostDom>(
    dom: D,
    json: &str,
) -> Result<NumberingEngine<D>, NumberingError> {
    let config = NumberingConfig::from_json(json)?;
    debug!(
        "Loaded configuration: {:?} strategy, {} resolver(s)",
        config.strategy,
        config.resolvers.len()
    );
    NumberingEngine::new(dom, config)
}
