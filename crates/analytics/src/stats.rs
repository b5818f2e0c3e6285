//! Small accumulation primitives shared by the aggregators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::summary::PairCount;

/// Order-independent key for an unordered pair of labels.
///
/// `PairKey::new("TOP", "JUNGLE") == PairKey::new("JUNGLE", "TOP")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    low: String,
    high: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    /// The two constituent labels, smaller first.
    pub fn parts(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }
}

/// Games/wins counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub games: u32,
    pub wins: u32,
}

impl Tally {
    pub fn record(&mut self, win: bool) {
        self.games += 1;
        if win {
            self.wins += 1;
        }
    }
}

/// Group-by counter keyed on `K`.
///
/// Ranking is fully deterministic: games descending, then wins descending,
/// then key ascending.
#[derive(Debug, Clone)]
pub struct TallyMap<K: Ord> {
    inner: BTreeMap<K, Tally>,
}

impl<K: Ord> Default for TallyMap<K> {
    fn default() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }
}

impl<K: Ord> TallyMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: K, win: bool) {
        self.inner.entry(key).or_default().record(win);
    }

    /// All buckets in rank order.
    pub fn ranked(self) -> Vec<(K, Tally)> {
        let mut rows: Vec<(K, Tally)> = self.inner.into_iter().collect();
        // BTreeMap yields keys ascending; the stable sort keeps that as the last tie-break.
        rows.sort_by(|(_, a), (_, b)| b.games.cmp(&a.games).then(b.wins.cmp(&a.wins)));
        rows
    }

    /// The first `n` buckets in rank order.
    pub fn top(self, n: usize) -> Vec<(K, Tally)> {
        let mut rows = self.ranked();
        rows.truncate(n);
        rows
    }
}

impl TallyMap<PairKey> {
    /// Ranked pairs split back into their two labels.
    pub fn top_pairs(self, n: usize) -> Vec<PairCount> {
        self.top(n)
            .into_iter()
            .map(|(key, tally)| {
                let (first, second) = key.parts();
                PairCount {
                    first: first.to_string(),
                    second: second.to_string(),
                    games: tally.games,
                    wins: tally.wins,
                }
            })
            .collect()
    }
}

/// Mean over an optional metric that tracks its own sample count.
///
/// Absent values are skipped, so a metric nobody reported averages to `None`
/// rather than `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptionalMean {
    sum: f64,
    samples: u32,
}

impl OptionalMean {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.samples += 1;
        }
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn value(&self) -> Option<f64> {
        (self.samples > 0).then(|| self.sum / f64::from(self.samples))
    }
}

/// `sum / count`, or `None` for an empty sample.
pub(crate) fn mean(sum: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}
