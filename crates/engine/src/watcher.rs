//! Debounce and single-flight scheduling for mutation-triggered passes.
//!
//! The watcher owns no timer. It keeps one pending deadline slot; the host
//! arms a real timer for [`MutationWatcher::deadline`] and calls back when it
//! fires. Scheduling again replaces the slot, so the last qualifying batch
//! wins and no queue of pending passes ever forms.
//!
//! Time is a `Duration` since session start, supplied by the caller.

use log::{debug, trace};
use serde::Serialize;
use std::time::Duration;

/// Gates evaluated for every incoming batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConditions {
    pub enabled: bool,
    pub loaded: bool,
    /// The engine is writing and this batch is its own echo.
    pub suppressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Suppressed,
    Disabled,
    NotLoaded,
    Irrelevant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Ignored(IgnoreReason),
    /// A pass is now pending at `deadline`.
    Scheduled { deadline: Duration },
    /// The pending pass moved to `deadline`.
    Rescheduled { deadline: Duration },
    /// A pass is running; the batch is counted but starts nothing.
    Absorbed,
}

impl WatchOutcome {
    /// The deadline the host timer must be (re)armed for, if any.
    pub fn deadline(&self) -> Option<Duration> {
        match *self {
            WatchOutcome::Scheduled { deadline } | WatchOutcome::Rescheduled { deadline } => {
                Some(deadline)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherStats {
    pub batches: u64,
    pub relevant: u64,
    pub ignored_suppressed: u64,
    pub ignored_disabled: u64,
    pub ignored_not_loaded: u64,
    pub ignored_irrelevant: u64,
    pub absorbed: u64,
    pub passes: u64,
}

#[derive(Debug, Clone)]
pub struct MutationWatcher {
    delay: Duration,
    pending: Option<Duration>,
    in_flight: bool,
    last_batch_at: Option<Duration>,
    stats: WatcherStats,
}

impl MutationWatcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            in_flight: false,
            last_batch_at: None,
            stats: WatcherStats::default(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Notes one delivered batch and decides what it schedules.
    pub fn on_batch(
        &mut self,
        relevant: bool,
        conditions: BatchConditions,
        now: Duration,
    ) -> WatchOutcome {
        self.stats.batches += 1;
        if let Some(previous) = self.last_batch_at.replace(now) {
            trace!(
                "Mutation batch {} ({}ms since previous)",
                self.stats.batches,
                now.saturating_sub(previous).as_millis()
            );
        }

        let ignored = if conditions.suppressed {
            Some(IgnoreReason::Suppressed)
        } else if !conditions.enabled {
            Some(IgnoreReason::Disabled)
        } else if !conditions.loaded {
            Some(IgnoreReason::NotLoaded)
        } else if !relevant {
            Some(IgnoreReason::Irrelevant)
        } else {
            None
        };
        if let Some(reason) = ignored {
            self.count_ignored(reason);
            return WatchOutcome::Ignored(reason);
        }

        self.stats.relevant += 1;
        if self.in_flight {
            self.stats.absorbed += 1;
            return WatchOutcome::Absorbed;
        }

        let deadline = now + self.delay;
        match self.pending.replace(deadline) {
            Some(_) => {
                trace!("Debounce reset to {}ms", deadline.as_millis());
                WatchOutcome::Rescheduled { deadline }
            }
            None => {
                debug!("Numbering pass scheduled in {}ms", self.delay.as_millis());
                WatchOutcome::Scheduled { deadline }
            }
        }
    }

    fn count_ignored(&mut self, reason: IgnoreReason) {
        let counter = match reason {
            IgnoreReason::Suppressed => &mut self.stats.ignored_suppressed,
            IgnoreReason::Disabled => &mut self.stats.ignored_disabled,
            IgnoreReason::NotLoaded => &mut self.stats.ignored_not_loaded,
            IgnoreReason::Irrelevant => &mut self.stats.ignored_irrelevant,
        };
        *counter += 1;
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Claims the pending pass if its deadline has passed and none is running.
    pub fn begin_due(&mut self, now: Duration) -> bool {
        match self.pending {
            Some(deadline) if deadline <= now && !self.in_flight => {
                self.pending = None;
                self.in_flight = true;
                true
            }
            _ => false,
        }
    }

    /// Ends the claimed pass. `ran` is false when the pass was dropped at
    /// fire time; only passes that ran are counted.
    pub fn finish(&mut self, ran: bool) {
        self.in_flight = false;
        if ran {
            self.stats.passes += 1;
        }
    }

    /// Drops the pending pass without running it.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn stats(&self) -> WatcherStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVE: BatchConditions = BatchConditions {
        enabled: true,
        loaded: true,
        suppressed: false,
    };

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_debounce_resets_on_each_batch() {
        let mut watcher = MutationWatcher::new(ms(500));
        assert_eq!(
            watcher.on_batch(true, LIVE, ms(0)),
            WatchOutcome::Scheduled { deadline: ms(500) }
        );
        assert_eq!(
            watcher.on_batch(true, LIVE, ms(300)),
            WatchOutcome::Rescheduled { deadline: ms(800) }
        );
        assert!(!watcher.begin_due(ms(500)));
        assert!(watcher.begin_due(ms(800)));
        assert!(!watcher.is_pending());
        watcher.finish(true);
        assert_eq!(watcher.stats().passes, 1);
    }

    #[test]
    fn test_in_flight_batches_are_absorbed() {
        let mut watcher = MutationWatcher::new(ms(100));
        watcher.on_batch(true, LIVE, ms(0));
        assert!(watcher.begin_due(ms(100)));

        assert_eq!(watcher.on_batch(true, LIVE, ms(120)), WatchOutcome::Absorbed);
        assert!(watcher.deadline().is_none());
        watcher.finish(true);

        assert_eq!(
            watcher.on_batch(true, LIVE, ms(200)),
            WatchOutcome::Scheduled { deadline: ms(300) }
        );
    }

    #[test]
    fn test_gates_in_priority_order() {
        let mut watcher = MutationWatcher::new(ms(100));
        let suppressed = BatchConditions {
            suppressed: true,
            enabled: false,
            ..LIVE
        };
        assert_eq!(
            watcher.on_batch(true, suppressed, ms(0)),
            WatchOutcome::Ignored(IgnoreReason::Suppressed)
        );
        let disabled = BatchConditions {
            enabled: false,
            ..LIVE
        };
        assert_eq!(
            watcher.on_batch(true, disabled, ms(0)),
            WatchOutcome::Ignored(IgnoreReason::Disabled)
        );
        let loading = BatchConditions {
            loaded: false,
            ..LIVE
        };
        assert_eq!(
            watcher.on_batch(true, loading, ms(0)),
            WatchOutcome::Ignored(IgnoreReason::NotLoaded)
        );
        assert_eq!(
            watcher.on_batch(false, LIVE, ms(0)),
            WatchOutcome::Ignored(IgnoreReason::Irrelevant)
        );

        let stats = watcher.stats();
        assert_eq!(stats.batches, 4);
        assert_eq!(stats.relevant, 0);
        assert_eq!(stats.ignored_suppressed, 1);
        assert_eq!(stats.ignored_irrelevant, 1);
        assert!(!watcher.is_pending());
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut watcher = MutationWatcher::new(ms(100));
        watcher.on_batch(true, LIVE, ms(0));
        assert!(watcher.cancel());
        assert!(!watcher.cancel());
        assert!(!watcher.begin_due(ms(1000)));
    }

    #[test]
    fn test_dropped_pass_is_not_counted() {
        let mut watcher = MutationWatcher::new(ms(100));
        watcher.on_batch(true, LIVE, ms(0));
        assert!(watcher.begin_due(ms(100)));
        watcher.finish(false);

        assert!(!watcher.is_in_flight());
        assert_eq!(watcher.stats().passes, 0);
    }
}
