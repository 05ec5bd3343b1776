//! Bounded-memory summaries of shuffled statistics.
//!
//! A [SufficientStats] keeps exact integer moments of the samples plus a
//! coarse histogram used to judge the goodness of fit of the null model.
//! Pushing samples and merging summaries commute: the final state only
//! depends on the multiset of samples, never on the order in which
//! minibatches were merged.
use std::collections::BTreeMap;

use crate::scheduler::Merge;

/// Upper bound on the number of histogram buckets.
pub const MAX_BUCKETS: usize = 4096;

/// Histogram whose bucket width doubles whenever it holds more than
/// [MAX_BUCKETS] buckets. Bucket `key` covers `[key << shift, (key + 1) << shift)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoarseHistogram {
    shift: u32,
    buckets: BTreeMap<u64, u64>,
}

impl CoarseHistogram {
    pub fn push(&mut self, value: u64) {
        *self.buckets.entry(value >> self.shift).or_default() += 1;
        self.shrink();
    }

    pub fn merge(&mut self, other: &CoarseHistogram) {
        self.coarsen_to(other.shift);
        let delta = self.shift - other.shift;
        for (&key, &count) in &other.buckets {
            *self.buckets.entry(key >> delta).or_default() += count;
        }
        self.shrink();
    }

    fn coarsen_to(&mut self, shift: u32) {
        if shift <= self.shift {
            return;
        }
        let delta = shift - self.shift;
        let mut coarser: BTreeMap<u64, u64> = BTreeMap::new();
        for (key, count) in std::mem::take(&mut self.buckets) {
            *coarser.entry(key >> delta).or_default() += count;
        }
        self.buckets = coarser;
        self.shift = shift;
    }

    fn shrink(&mut self) {
        while self.buckets.len() > MAX_BUCKETS {
            self.coarsen_to(self.shift + 1);
        }
    }

    /// `(lowest value, highest value, count)` of each non-empty bucket, in
    /// increasing order. Bounds are inclusive.
    pub fn bins(&self) -> impl Iterator<Item = (u64, u64, u64)> + '_ {
        self.buckets.iter().map(move |(&key, &count)| {
            let low = key << self.shift;
            let high = low.saturating_add((1u64 << self.shift) - 1);
            (low, high, count)
        })
    }

    pub fn bucket_width(&self) -> u64 {
        1 << self.shift
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SufficientStats {
    count: u64,
    sum: u128,
    sum_sq: u128,
    min: u64,
    max: u64,
    histogram: CoarseHistogram,
}

impl Default for SufficientStats {
    fn default() -> Self {
        SufficientStats {
            count: 0,
            sum: 0,
            sum_sq: 0,
            min: u64::MAX,
            max: 0,
            histogram: CoarseHistogram::default(),
        }
    }
}

impl SufficientStats {
    pub fn push(&mut self, value: u64) {
        let wide = value as u128;
        self.count += 1;
        self.sum += wide;
        self.sum_sq += wide * wide;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.histogram.push(value);
    }

    pub fn merge(&mut self, other: &SufficientStats) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.histogram.merge(&other.histogram);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> Option<u64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<u64> {
        (self.count > 0).then_some(self.max)
    }

    /// Sample mean, 0 without samples.
    pub fn mean(&self) -> f64 {
        match self.count {
            0 => 0.0,
            n => self.sum as f64 / n as f64,
        }
    }

    /// Unbiased sample variance, 0 with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as u128;
        // n * Σx² - (Σx)² is exact in integers and never negative
        let spread = n * self.sum_sq - self.sum * self.sum;
        spread as f64 / (n * (n - 1)) as f64
    }

    pub fn histogram(&self) -> &CoarseHistogram {
        &self.histogram
    }
}

impl Merge for SufficientStats {
    fn merge(&mut self, other: Self) {
        SufficientStats::merge(self, &other);
    }
}

impl Extend<u64> for SufficientStats {
    fn extend<T: IntoIterator<Item = u64>>(&mut self, iter: T) {
        for value in iter {
            self.push(value);
        }
    }
}
