//! Hierarchical heading numbering for a live, structurally unstable document.
//!
//! One numbering pass flows in a single direction:
//!
//! ```text
//! watcher (or manual trigger) -> collector -> classifier (per element)
//!     -> numbering (document order + level counters) -> applicator
//! ```
//!
//! The applicator writes to the document, which feeds the watcher again; the
//! engine suppresses its own echoes and every pass is idempotent, so a second
//! pass over an unchanged document performs no writes.
//!
//! ## Module Structure
//!
//! - [`config`] - `NumberingConfig` and its validated, compiled form
//! - [`classifier`] - tag / class-marker / font-size level resolution
//! - [`collector`] - redundant structural queries, deduplicated
//! - [`numbering`] - document ordering and level counters
//! - [`prefix`] - recognising an existing dotted number in heading text
//! - [`applicator`] - content-rewrite and overlay-marker strategies
//! - [`relevance`] - which mutation records can affect numbering
//! - [`watcher`] - debounce and single-flight scheduling
//! - [`engine`] - the per-session engine and its enabled/disabled lifecycle
//! - [`command`], [`prefs`] - the boundary to the popup and preference store
//! - [`diagnostics`] - structure analysis logged at start-up

pub mod applicator;
pub mod classifier;
pub mod collector;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod numbering;
pub mod prefix;
pub mod prefs;
pub mod relevance;
pub mod watcher;

pub use applicator::Applicator;
pub use classifier::{classify, is_heading_like};
pub use collector::{HeadingCandidate, collect};
pub use command::{Command, CommandResponse, CommandStatus};
pub use config::{
    ApplyStrategy, ClassMarker, CompiledConfig, FontThresholds, LevelResolver, NumberingConfig,
};
pub use diagnostics::{StructureReport, analyze_structure};
pub use engine::{NumberingEngine, PassReport};
pub use error::{ApplyError, ConfigError, NumberingError, PreferenceError};
pub use numbering::{LevelCounters, NumberedHeading, Prefix, compute_numbers, prefixes_for_levels};
pub use prefix::{split_prefix, strip_prefix};
pub use prefs::{AUTO_NUMBERING_KEY, InMemoryPreferenceStore, PreferenceStore};
pub use watcher::{BatchConditions, IgnoreReason, MutationWatcher, WatchOutcome, WatcherStats};
