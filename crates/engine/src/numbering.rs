//! Orders collected headings and computes their canonical prefixes.

use crate::collector::HeadingCandidate;
use crate::config::MAX_LEVELS;
use secnum_dom::HostDom;
use std::fmt;

/// A dotted hierarchical number such as `2.1.3.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Prefix(Vec<u32>);

impl Prefix {
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for n in &self.0 {
            write!(f, "{}.", n)?;
        }
        Ok(())
    }
}

/// One counter per level, owned by a single pass and never persisted.
#[derive(Debug, Clone, Default)]
pub struct LevelCounters([u32; MAX_LEVELS]);

impl LevelCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a heading at `level` (1-based) and returns its prefix.
    ///
    /// Deeper counters reset to zero. Shallower counters that were never
    /// seen are back-filled to 1, so a lone level-3 heading reads `1.1.1.`.
    pub fn advance(&mut self, level: u8) -> Prefix {
        let depth = (level as usize).clamp(1, MAX_LEVELS);
        let idx = depth - 1;

        self.0[idx] += 1;
        for counter in &mut self.0[depth..] {
            *counter = 0;
        }
        for counter in &mut self.0[..idx] {
            if *counter == 0 {
                *counter = 1;
            }
        }
        Prefix(self.0[..depth].to_vec())
    }
}

/// A candidate with its canonical prefix for this pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedHeading<N> {
    pub candidate: HeadingCandidate<N>,
    pub prefix: Prefix,
}

/// Sorts candidates into document order and numbers them.
///
/// Level-0 candidates are dropped. The sort is stable, so candidates the host
/// reports as the same position keep their input order.
pub fn compute_numbers<D: HostDom + ?Sized>(
    dom: &D,
    candidates: Vec<HeadingCandidate<D::Node>>,
) -> Vec<NumberedHeading<D::Node>> {
    let mut ordered: Vec<_> = candidates.into_iter().filter(|c| c.level > 0).collect();
    ordered.sort_by(|a, b| dom.compare_position(&a.element, &b.element));

    let mut counters = LevelCounters::new();
    ordered
        .into_iter()
        .map(|candidate| {
            let prefix = counters.advance(candidate.level);
            NumberedHeading { candidate, prefix }
        })
        .collect()
}

/// Prefixes for a bare sequence of levels already in document order.
pub fn prefixes_for_levels(levels: &[u8]) -> Vec<Prefix> {
    let mut counters = LevelCounters::new();
    levels.iter().map(|&level| counters.advance(level)).collect()
}
