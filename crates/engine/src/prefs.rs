//! Boundary to the external on/off preference store.
//!
//! The store holds a single boolean under [`AUTO_NUMBERING_KEY`]. The engine
//! reads it once at start-up; toggles write it back.

use crate::error::PreferenceError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

/// Storage key of the enabled flag.
pub const AUTO_NUMBERING_KEY: &str = "autoNumbering";

/// A key-value store holding the auto-numbering preference.
///
/// # Implementations
///
/// - `InMemoryPreferenceStore`: process-local, used by tests and native hosts
/// - The browser extension keeps the flag in its own storage area and passes
///   the loaded value straight to the engine.
pub trait PreferenceStore: Debug {
    /// The stored flag, `false` when nothing was ever stored.
    fn load_enabled(&self) -> Result<bool, PreferenceError>;

    fn store_enabled(&self, enabled: bool) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: RwLock<HashMap<String, bool>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `enabled`, like after a previous session.
    pub fn with_enabled(enabled: bool) -> Self {
        let mut values = HashMap::new();
        values.insert(AUTO_NUMBERING_KEY.to_string(), enabled);
        Self {
            values: RwLock::new(values),
        }
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn load_enabled(&self) -> Result<bool, PreferenceError> {
        let values = self
            .values
            .read()
            .map_err(|_| PreferenceError::LockPoisoned)?;
        Ok(values.get(AUTO_NUMBERING_KEY).copied().unwrap_or(false))
    }

    fn store_enabled(&self, enabled: bool) -> Result<(), PreferenceError> {
        let mut values = self
            .values
            .write()
            .map_err(|_| PreferenceError::LockPoisoned)?;
        values.insert(AUTO_NUMBERING_KEY.to_string(), enabled);
        Ok(())
    }
}
