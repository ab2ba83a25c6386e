//! The per-session numbering engine.
//!
//! A [`NumberingEngine`] owns the host document handle, the compiled
//! configuration and all mutable session state: the enabled flag, the single
//! mutation subscription and the self-write suppression flag. It is built
//! once per page session and driven by three kinds of calls:
//!
//! - lifecycle and commands (`initialize`, `set_enabled`, `apply_once`, ...)
//! - [`NumberingEngine::pump`] when the host has delivered mutation records
//! - [`NumberingEngine::tick`] when the host timer for
//!   [`NumberingEngine::next_deadline`] fires

use crate::applicator::Applicator;
use crate::collector::{HeadingCandidate, collect};
use crate::command::{Command, CommandResponse};
use crate::config::{CompiledConfig, NumberingConfig};
use crate::diagnostics::{StructureReport, analyze_structure};
use crate::error::NumberingError;
use crate::numbering::compute_numbers;
use crate::prefs::PreferenceStore;
use crate::relevance::batch_is_relevant;
use crate::watcher::{BatchConditions, MutationWatcher, WatchOutcome, WatcherStats};
use log::{debug, error, info, trace, warn};
use secnum_dom::{HostDom, ObserveOptions};
use serde::Serialize;
use std::cell::Cell;
use std::fmt;
use std::time::Duration;

/// Counts from one numbering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Candidates found by the collector.
    pub collected: usize,
    /// Candidates that received a prefix.
    pub numbered: usize,
    pub written: usize,
    /// Already showing their canonical prefix.
    pub unchanged: usize,
    pub skipped_empty: usize,
    pub failed: usize,
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} collected, {} numbered, {} written, {} unchanged, {} empty, {} failed",
            self.collected,
            self.numbered,
            self.written,
            self.unchanged,
            self.skipped_empty,
            self.failed
        )
    }
}

/// The single live mutation subscription.
#[derive(Debug)]
struct WatcherHandle<N> {
    root: N,
    watcher: MutationWatcher,
}

#[derive(Debug)]
struct EngineState<N> {
    enabled: bool,
    watcher: Option<WatcherHandle<N>>,
    suppressing: Cell<bool>,
}

/// Holds the suppression flag for its lifetime, clearing it on every exit
/// path.
struct SuppressionGuard<'a>(&'a Cell<bool>);

impl<'a> SuppressionGuard<'a> {
    fn hold(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct NumberingEngine<D: HostDom> {
    dom: D,
    config: CompiledConfig,
    state: EngineState<D::Node>,
}

impl<D: HostDom> fmt::Debug for NumberingEngine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberingEngine")
            .field("strategy", &self.config.strategy())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<D: HostDom> NumberingEngine<D> {
    /// Builds a disabled engine with no subscription. Fails only on an
    /// invalid configuration.
    pub fn new(dom: D, config: NumberingConfig) -> Result<Self, NumberingError> {
        let config = config.compile()?;
        debug!(
            "Engine created: strategy {:?}, {} heading queries, debounce {}ms",
            config.strategy(),
            config.heading_selectors.len(),
            config.settings.debounce_ms
        );
        Ok(Self {
            dom,
            config,
            state: EngineState {
                enabled: false,
                watcher: None,
                suppressing: Cell::new(false),
            },
        })
    }

    /// Reads the enabled flag from `prefs` and initializes with it. A store
    /// that cannot be read leaves the engine disabled.
    pub fn initialize(&mut self, prefs: &dyn PreferenceStore) -> Option<PassReport> {
        let enabled = prefs.load_enabled().unwrap_or_else(|e| {
            error!("Could not read auto-numbering preference, starting disabled: {}", e);
            false
        });
        self.initialize_with(enabled)
    }

    /// Logs the page structure, runs the first pass when `enabled`, then
    /// (re)creates the mutation subscription.
    pub fn initialize_with(&mut self, enabled: bool) -> Option<PassReport> {
        info!("Initializing auto-numbering (enabled: {})", enabled);
        debug!("Page structure: {}", self.structure_report());

        self.state.enabled = enabled;
        let report = enabled.then(|| self.run_pass("initialize"));
        self.arm_watcher();
        report
    }

    /// Tears down any existing subscription and subscribes on the first
    /// matching content container, falling back to the body. Returns whether
    /// a subscription is live; without one the engine keeps working for
    /// manual passes.
    pub fn arm_watcher(&mut self) -> bool {
        self.disarm_watcher();

        let options = ObserveOptions {
            child_list: true,
            character_data: self.config.settings.observe_character_data,
        };
        let container = self
            .config
            .container_selectors
            .iter()
            .find_map(|selector| match self.dom.query_first(None, selector) {
                Ok(found) => found,
                Err(e) => {
                    warn!("Container query '{}' failed: {}", selector, e);
                    None
                }
            });

        let mut roots = Vec::with_capacity(2);
        match container {
            Some(node) => roots.push(node),
            None => debug!("No content container found, observing the body"),
        }
        if let Some(body) = self.dom.body()
            && !roots.contains(&body)
        {
            roots.push(body);
        }

        for root in roots {
            match self.dom.observe(&root, options) {
                Ok(()) => {
                    info!("Watching mutations under {:?}", root);
                    self.state.watcher = Some(WatcherHandle {
                        root,
                        watcher: MutationWatcher::new(self.config.settings.debounce()),
                    });
                    return true;
                }
                Err(e) => warn!("Could not observe {:?}: {}", root, e),
            }
        }
        error!("Mutation watching unavailable; only manual numbering will work");
        false
    }

    fn disarm_watcher(&mut self) {
        if self.state.watcher.take().is_some() {
            self.dom.disconnect();
            debug!("Previous mutation subscription torn down");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn is_watching(&self) -> bool {
        self.state.watcher.is_some()
    }

    /// The node the live subscription is attached to.
    pub fn watch_root(&self) -> Option<&D::Node> {
        self.state.watcher.as_ref().map(|h| &h.root)
    }

    pub fn is_suppressing(&self) -> bool {
        self.state.suppressing.get()
    }

    pub fn watcher_stats(&self) -> Option<WatcherStats> {
        self.state.watcher.as_ref().map(|h| h.watcher.stats())
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.watcher.as_ref().and_then(|h| h.watcher.deadline())
    }

    pub fn config(&self) -> &CompiledConfig {
        &self.config
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Direct access to the document, for hosts and tests that edit it.
    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn into_dom(self) -> D {
        self.dom
    }

    pub fn structure_report(&self) -> StructureReport {
        analyze_structure(&self.dom, &self.config)
    }

    /// Switches the enabled flag.
    ///
    /// Turning on runs one pass immediately (and re-arms a missing
    /// subscription); turning off cancels a pending pass and leaves every
    /// number already on the page in place. Setting the current value again
    /// does nothing.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<PassReport> {
        if enabled == self.state.enabled {
            debug!("Auto-numbering already {}", if enabled { "on" } else { "off" });
            return None;
        }
        self.state.enabled = enabled;

        if enabled {
            info!("Auto-numbering enabled");
            let report = self.run_pass("enable");
            if self.state.watcher.is_none() {
                self.arm_watcher();
            }
            Some(report)
        } else {
            info!("Auto-numbering disabled");
            if let Some(handle) = self.state.watcher.as_mut()
                && handle.watcher.cancel()
            {
                debug!("Pending numbering pass cancelled");
            }
            None
        }
    }

    /// Persists the new flag, then applies it. A store failure is logged and
    /// the in-session toggle still happens.
    pub fn toggle(&mut self, enabled: bool, prefs: &dyn PreferenceStore) -> Option<PassReport> {
        if let Err(e) = prefs.store_enabled(enabled) {
            warn!("Could not store auto-numbering preference: {}", e);
        }
        self.set_enabled(enabled)
    }

    /// One full pass regardless of the enabled flag.
    pub fn apply_once(&mut self) -> PassReport {
        self.run_pass("manual")
    }

    /// Takes numbering off the page regardless of the enabled flag. Returns
    /// the number of headings changed.
    pub fn remove_once(&mut self) -> usize {
        let watching = self.state.watcher.is_some();
        discard_records(&mut self.dom, watching, "stale");
        let candidates: Vec<HeadingCandidate<D::Node>> = collect(&self.dom, &self.config);

        let removed = {
            let _suppress = SuppressionGuard::hold(&self.state.suppressing);
            let removed = Applicator::new(&self.config).remove(&mut self.dom, &candidates);
            discard_records(&mut self.dom, watching, "self-write");
            removed
        };
        info!("Removed numbering from {} heading(s)", removed);
        removed
    }

    /// Runs a popup command and acknowledges it.
    pub fn handle_command(&mut self, command: Command) -> CommandResponse {
        debug!("Received command {:?}", command);
        match command {
            Command::ToggleAutoNumbering { enabled } => {
                self.set_enabled(enabled);
            }
            Command::ApplyNumbering => {
                let report = self.apply_once();
                info!("Manual numbering pass: {}", report);
            }
            Command::RemoveNumbering => {
                self.remove_once();
            }
        }
        CommandResponse::success()
    }

    /// Feeds mutation records queued by the host into the watcher.
    ///
    /// Returns `None` when nothing was queued or no subscription is live.
    pub fn pump(&mut self, now: Duration) -> Option<WatchOutcome> {
        let handle = self.state.watcher.as_mut()?;
        let records = self.dom.take_records();
        if records.is_empty() {
            return None;
        }

        let relevant = batch_is_relevant(&self.dom, &records, &self.config);
        let conditions = BatchConditions {
            enabled: self.state.enabled,
            loaded: self.dom.is_loaded(),
            suppressed: self.state.suppressing.get(),
        };
        let outcome = handle.watcher.on_batch(relevant, conditions, now);
        trace!("{} mutation record(s): {:?}", records.len(), outcome);
        Some(outcome)
    }

    /// Runs the pending pass if its deadline has been reached.
    ///
    /// The enabled and loaded gates are checked again at fire time.
    pub fn tick(&mut self, now: Duration) -> Option<PassReport> {
        let handle = self.state.watcher.as_mut()?;
        if !handle.watcher.begin_due(now) {
            return None;
        }

        let report = if self.state.enabled && self.dom.is_loaded() {
            Some(self.run_pass("mutation"))
        } else {
            debug!("Scheduled pass dropped: engine disabled or document loading");
            None
        };
        if let Some(handle) = self.state.watcher.as_mut() {
            handle.watcher.finish(report.is_some());
        }
        report
    }

    /// Collect, classify, order and number, then apply. Every candidate is
    /// read and sorted before the first write.
    fn run_pass(&mut self, trigger: &str) -> PassReport {
        let watching = self.state.watcher.is_some();
        discard_records(&mut self.dom, watching, "stale");

        let candidates = collect(&self.dom, &self.config);
        let mut report = PassReport {
            collected: candidates.len(),
            ..PassReport::default()
        };

        let number_empty = self.config.settings.number_empty_headings;
        let (numberable, mut unnumbered): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| number_empty || !c.title().is_empty());
        report.skipped_empty = unnumbered.len();
        let (numberable, unresolved): (Vec<_>, Vec<_>) =
            numberable.into_iter().partition(|c| c.level > 0);
        unnumbered.extend(unresolved);

        let numbered = compute_numbers(&self.dom, numberable);
        report.numbered = numbered.len();

        {
            let _suppress = SuppressionGuard::hold(&self.state.suppressing);
            let applicator = Applicator::new(&self.config);
            for candidate in &unnumbered {
                match applicator.clear(&mut self.dom, candidate) {
                    Ok(true) => report.written += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Could not clear stale number on {:?}: {}", candidate.element, e);
                        report.failed += 1;
                    }
                }
            }
            for heading in &numbered {
                match applicator.apply(&mut self.dom, heading) {
                    Ok(true) => report.written += 1,
                    Ok(false) => report.unchanged += 1,
                    Err(e) => {
                        warn!(
                            "Could not number heading '{}' as {}: {}",
                            heading.candidate.title(),
                            heading.prefix,
                            e
                        );
                        report.failed += 1;
                    }
                }
            }
            discard_records(&mut self.dom, watching, "self-write");
        }

        debug!("Numbering pass ({}): {}", trigger, report);
        report
    }
}

/// Drops queued records: before a pass they describe changes the pass
/// covers, after its writes they are the engine's own echo.
fn discard_records<D: HostDom>(dom: &mut D, watching: bool, kind: &str) {
    if !watching {
        return;
    }
    let dropped = dom.take_records().len();
    if dropped > 0 {
        trace!("Discarded {} {} mutation record(s)", dropped, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApplyStrategy;
    use crate::prefs::InMemoryPreferenceStore;
    use crate::watcher::IgnoreReason;
    use secnum_dom::{MemoryDom, NodeId};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn page(headings: &[(&str, &str)]) -> (MemoryDom, Vec<NodeId>) {
        let mut dom = MemoryDom::new();
        let body = dom.body_id();
        let content = dom.append_element(body, "div", &[("class", "notion-page-content")]);
        let nodes = headings
            .iter()
            .map(|(tag, text)| {
                let h = dom.append_element(content, tag, &[]);
                dom.append_text(h, text);
                h
            })
            .collect();
        (dom, nodes)
    }

    fn texts(engine: &NumberingEngine<MemoryDom>, nodes: &[NodeId]) -> Vec<String> {
        nodes.iter().map(|n| engine.dom().text_content(n)).collect()
    }

    #[test]
    fn test_initialize_enabled_numbers_and_watches_container() {
        let (dom, nodes) = page(&[("h1", "Intro"), ("h2", "Scope"), ("h1", "Usage")]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();

        let report = engine.initialize_with(true).unwrap();
        assert_eq!(report.written, 3);
        assert_eq!(texts(&engine, &nodes), vec!["1. Intro", "1.1. Scope", "2. Usage"]);

        let root = *engine.watch_root().unwrap();
        assert_eq!(engine.dom().class_list(&root), vec!["notion-page-content"]);
        assert!(!engine.is_suppressing());
    }

    #[test]
    fn test_second_pass_writes_nothing() {
        let (dom, _) = page(&[("h1", "Intro"), ("h3", "Deep")]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();
        engine.initialize_with(true);
        engine.dom_mut().clear_signals();

        let report = engine.apply_once();
        assert_eq!(report.written, 0);
        assert_eq!(report.unchanged, 2);
        assert!(engine.dom().signals().is_empty());
        assert_eq!(engine.pump(ms(0)), None);
    }

    #[test]
    fn test_disabled_preference_means_no_pass() {
        let (dom, nodes) = page(&[("h1", "Intro")]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();

        assert!(engine.initialize(&InMemoryPreferenceStore::new()).is_none());
        assert!(engine.is_watching());
        assert_eq!(texts(&engine, &nodes), vec!["Intro"]);

        let content = *engine.watch_root().unwrap();
        engine.dom_mut().append_element(content, "h2", &[]);
        assert_eq!(
            engine.pump(ms(0)),
            Some(WatchOutcome::Ignored(IgnoreReason::Disabled))
        );
    }

    #[test]
    fn test_mutation_schedules_one_debounced_pass() {
        let (dom, _) = page(&[("h1", "Intro")]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();
        engine.initialize_with(true);

        let content = *engine.watch_root().unwrap();
        let added = engine.dom_mut().append_element(content, "h2", &[]);
        engine.dom_mut().append_text(added, "Details");
        assert_eq!(
            engine.pump(ms(1000)),
            Some(WatchOutcome::Scheduled { deadline: ms(1500) })
        );
        assert_eq!(engine.tick(ms(1200)), None);

        let report = engine.tick(ms(1500)).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(engine.dom().text_content(&added), "1.1. Details");
        // The pass's own writes were discarded.
        assert_eq!(engine.pump(ms(1600)), None);
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn test_disable_cancels_pending_and_keeps_numbers() {
        let (dom, nodes) = page(&[("h1", "Intro")]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();
        engine.initialize_with(true);

        let content = *engine.watch_root().unwrap();
        engine.dom_mut().append_element(content, "h2", &[]);
        engine.pump(ms(0));
        assert!(engine.next_deadline().is_some());

        assert!(engine.set_enabled(false).is_none());
        assert_eq!(engine.next_deadline(), None);
        assert_eq!(engine.tick(ms(10_000)), None);
        assert_eq!(texts(&engine, &nodes), vec!["1. Intro"]);
    }

    #[test]
    fn test_enable_twice_runs_one_pass() {
        let (dom, _) = page(&[("h1", "Intro")]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();
        engine.initialize_with(false);

        assert!(engine.set_enabled(true).is_some());
        assert!(engine.set_enabled(true).is_none());
    }

    #[test]
    fn test_empty_headings_are_not_numbered() {
        let (dom, nodes) = page(&[("h1", "  "), ("h1", "Intro")]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();

        let report = engine.apply_once();
        assert_eq!(report.skipped_empty, 1);
        assert_eq!(texts(&engine, &nodes), vec!["  ", "1. Intro"]);
    }

    #[test]
    fn test_failed_heading_does_not_abort_pass() {
        let (mut dom, nodes) = page(&[("h1", "Locked"), ("h1", "Open")]);
        dom.make_read_only(nodes[0]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();

        let report = engine.apply_once();
        assert_eq!(report.failed, 1);
        assert_eq!(report.written, 1);
        assert_eq!(texts(&engine, &nodes), vec!["Locked", "2. Open"]);
        assert!(!engine.is_suppressing());
    }

    #[test]
    fn test_observe_failure_falls_back_then_degrades() {
        let (mut dom, nodes) = page(&[("h1", "Intro")]);
        let content = dom.parent(&nodes[0]).unwrap();
        dom.refuse_observation(content);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();
        engine.initialize_with(false);
        assert_eq!(engine.watch_root(), Some(&engine.dom().body_id()));

        let body = engine.dom().body_id();
        engine.dom_mut().refuse_observation(body);
        assert!(!engine.arm_watcher());
        assert!(!engine.is_watching());

        // Manual numbering still works.
        assert_eq!(engine.apply_once().written, 1);
    }

    #[test]
    fn test_remove_once_in_overlay_mode() {
        let (dom, nodes) = page(&[("h1", "Intro"), ("h2", "Scope")]);
        let config = NumberingConfig {
            strategy: ApplyStrategy::OverlayMarker,
            ..NumberingConfig::default()
        };
        let mut engine = NumberingEngine::new(dom, config).unwrap();
        engine.initialize_with(true);
        assert_eq!(texts(&engine, &nodes), vec!["1. Intro", "1.1. Scope"]);

        assert_eq!(engine.remove_once(), 2);
        assert_eq!(texts(&engine, &nodes), vec!["Intro", "Scope"]);
        assert!(engine.is_enabled());
        assert_eq!(engine.pump(ms(0)), None);
    }

    #[test]
    fn test_commands_are_acknowledged() {
        let (dom, nodes) = page(&[("h1", "Intro")]);
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();
        engine.initialize_with(false);

        let ack = engine.handle_command(Command::ApplyNumbering);
        assert_eq!(ack, CommandResponse::success());
        assert_eq!(texts(&engine, &nodes), vec!["1. Intro"]);
        assert!(!engine.is_enabled());

        engine.handle_command(Command::RemoveNumbering);
        assert_eq!(texts(&engine, &nodes), vec!["Intro"]);

        engine.handle_command(Command::ToggleAutoNumbering { enabled: true });
        assert!(engine.is_enabled());
        assert_eq!(texts(&engine, &nodes), vec!["1. Intro"]);
    }

    #[test]
    fn test_toggle_persists_preference() {
        let (dom, _) = page(&[("h1", "Intro")]);
        let prefs = InMemoryPreferenceStore::new();
        let mut engine = NumberingEngine::new(dom, NumberingConfig::default()).unwrap();
        engine.initialize(&prefs);

        engine.toggle(true, &prefs);
        assert!(prefs.load_enabled().unwrap());
        engine.toggle(false, &prefs);
        assert!(!prefs.load_enabled().unwrap());
    }
}
