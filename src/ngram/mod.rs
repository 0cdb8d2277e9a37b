//! N-gram frequency tables and the accumulator that fills them.
//!
//! `NGramCounts` owns one table per order `1..=n`. Counting is a pure
//! additive accumulation, so shards counted independently can be merged
//! in any order and produce the same tables.

mod codec;

pub use codec::{read_header, CodecError, ModelHeader};

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::symbol::{NGramKey, Symbol, SymbolMode, MAX_ORDER};

/// Frequency table for one n-gram order.
pub type NGramTable = HashMap<NGramKey, u32>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NGramCounts {
    order: usize,
    mode: SymbolMode,
    num_single: u32,
    /// `tables[k]` holds windows of length `k + 1`.
    tables: Vec<NGramTable>,
}

impl NGramCounts {
    pub fn new(order: usize, mode: SymbolMode) -> Self {
        assert!(
            (1..=MAX_ORDER).contains(&order),
            "n-gram order must be in 1..={MAX_ORDER}, got {order}"
        );
        Self {
            order,
            mode,
            num_single: 0,
            tables: vec![NGramTable::new(); order],
        }
    }

    pub(crate) fn from_parts(
        order: usize,
        mode: SymbolMode,
        num_single: u32,
        tables: Vec<NGramTable>,
    ) -> Self {
        debug_assert_eq!(tables.len(), order);
        Self {
            order,
            mode,
            num_single,
            tables,
        }
    }

    /// Count every window of length `1..=order` in one segment.
    pub fn count_segment(&mut self, symbols: &[Symbol]) {
        debug_assert!(
            self.mode.is_dual() || symbols.iter().all(|s| s.syllable == 0),
            "single-mode counts received a syllable-tagged symbol"
        );
        for (k, table) in self.tables.iter_mut().enumerate() {
            for window in symbols.windows(k + 1) {
                let slot = table.entry(NGramKey::from_symbols(window)).or_insert(0);
                *slot = slot.saturating_add(1);
            }
        }
        self.num_single = self
            .num_single
            .saturating_add(u32::try_from(symbols.len()).unwrap_or(u32::MAX));
    }

    /// Additive union of two accumulators with the same order and mode.
    pub fn merge(mut self, other: Self) -> Self {
        self.merge_from(other);
        self
    }

    pub fn merge_from(&mut self, other: Self) {
        assert_eq!(self.order, other.order, "cannot merge different orders");
        assert_eq!(self.mode, other.mode, "cannot merge different symbol modes");
        self.num_single = self.num_single.saturating_add(other.num_single);
        for (mine, theirs) in self.tables.iter_mut().zip(other.tables) {
            for (key, count) in theirs {
                let slot = mine.entry(key).or_insert(0);
                *slot = slot.saturating_add(count);
            }
        }
    }

    /// Drop every entry of order ≥ 2 whose count is ≤ `threshold`.
    ///
    /// Unigrams are kept whole: they normalise every conditional
    /// probability. Returns the number of entries removed.
    pub fn prune(&mut self, threshold: u32) -> usize {
        let mut removed = 0;
        for (k, table) in self.tables.iter_mut().enumerate().skip(1) {
            let before = table.len();
            table.retain(|_, count| *count > threshold);
            debug!(order = k + 1, before, after = table.len(), "pruned");
            removed += before - table.len();
        }
        removed
    }

    pub fn unigram(&self, a: Symbol) -> u32 {
        self.lookup(1, NGramKey::unigram(a))
    }

    pub fn bigram(&self, a: Symbol, b: Symbol) -> u32 {
        self.lookup(2, NGramKey::bigram(a, b))
    }

    pub fn trigram(&self, a: Symbol, b: Symbol, c: Symbol) -> u32 {
        self.lookup(3, NGramKey::trigram(a, b, c))
    }

    /// Count for an arbitrary window; 0 when absent or longer than the order.
    pub fn count(&self, window: &[Symbol]) -> u32 {
        if window.is_empty() || window.len() > self.order {
            return 0;
        }
        self.lookup(window.len(), NGramKey::from_symbols(window))
    }

    fn lookup(&self, n: usize, key: NGramKey) -> u32 {
        self.tables
            .get(n - 1)
            .and_then(|t| t.get(&key))
            .copied()
            .unwrap_or(0)
    }

    /// Table for windows of length `n` (1-based).
    pub fn table(&self, n: usize) -> Option<&NGramTable> {
        n.checked_sub(1).and_then(|i| self.tables.get(i))
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn mode(&self) -> SymbolMode {
        self.mode
    }

    /// Total number of unigram observations.
    pub fn num_single(&self) -> u32 {
        self.num_single
    }

    /// Entry count per order, lowest order first.
    pub fn sizes(&self) -> Vec<usize> {
        self.tables.iter().map(HashMap::len).collect()
    }
}

/// Count segments across the rayon pool and reduce the shards.
pub fn count_parallel(segments: &[Vec<Symbol>], order: usize, mode: SymbolMode) -> NGramCounts {
    segments
        .par_iter()
        .fold(
            || NGramCounts::new(order, mode),
            |mut acc, seg| {
                acc.count_segment(seg);
                acc
            },
        )
        .reduce(|| NGramCounts::new(order, mode), NGramCounts::merge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(ch: u16) -> Symbol {
        Symbol::single(ch)
    }

    fn segments() -> Vec<Vec<Symbol>> {
        vec![
            vec![s(0), s(1), s(2)],
            vec![s(0), s(1)],
            vec![s(3), s(0), s(1), s(2)],
            vec![s(4)],
        ]
    }

    fn counted(segs: &[Vec<Symbol>], order: usize) -> NGramCounts {
        let mut counts = NGramCounts::new(order, SymbolMode::Single);
        for seg in segs {
            counts.count_segment(seg);
        }
        counts
    }

    #[test]
    fn counts_every_window() {
        let counts = counted(&segments(), 3);
        assert_eq!(counts.num_single(), 10);
        assert_eq!(counts.unigram(s(0)), 3);
        assert_eq!(counts.unigram(s(4)), 1);
        assert_eq!(counts.bigram(s(0), s(1)), 3);
        assert_eq!(counts.bigram(s(1), s(2)), 2);
        assert_eq!(counts.bigram(s(3), s(0)), 1);
        assert_eq!(counts.trigram(s(0), s(1), s(2)), 2);
        assert_eq!(counts.count(&[s(3), s(0), s(1)]), 1);
        assert_eq!(counts.count(&[]), 0);
    }

    #[test]
    fn windows_do_not_cross_segments() {
        let counts = counted(&segments(), 2);
        // segment 1 ends with 1, segment 2 starts with 0
        assert_eq!(counts.bigram(s(1), s(0)), 0);
        assert_eq!(counts.bigram(s(2), s(0)), 0);
    }

    #[test]
    fn num_single_matches_unigram_sum() {
        let counts = counted(&segments(), 2);
        let total: u32 = counts.table(1).unwrap().values().sum();
        assert_eq!(total, counts.num_single());
    }

    #[test]
    fn order_is_independent_of_segment_order() {
        let mut shuffled = segments();
        shuffled.reverse();
        shuffled.swap(0, 2);
        let mut a = counted(&segments(), 3);
        let mut b = counted(&shuffled, 3);
        assert_eq!(a, b);
        a.prune(1);
        b.prune(1);
        assert_eq!(a, b);
    }

    #[test]
    fn prune_removes_at_or_below_threshold() {
        let mut counts = counted(&segments(), 3);
        let before = counts.clone();
        let removed = counts.prune(1);
        assert!(removed > 0);
        for n in 2..=3 {
            for (key, &c) in counts.table(n).unwrap() {
                assert!(c > 1);
                assert_eq!(before.table(n).unwrap()[key], c);
            }
            for (key, &c) in before.table(n).unwrap() {
                if c > 1 {
                    assert_eq!(counts.table(n).unwrap().get(key), Some(&c));
                }
            }
        }
        // unigrams survive untouched
        assert_eq!(counts.table(1), before.table(1));
        assert_eq!(counts.unigram(s(4)), 1);
    }

    #[test]
    fn merge_is_additive() {
        let segs = segments();
        let (left, right) = segs.split_at(2);
        let merged = counted(left, 3).merge(counted(right, 3));
        assert_eq!(merged, counted(&segs, 3));
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut segs = Vec::new();
        for i in 0..200u16 {
            segs.push(vec![s(i % 7), s(i % 5), s(i % 3), s(i % 2)]);
        }
        assert_eq!(
            count_parallel(&segs, 3, SymbolMode::Single),
            counted(&segs, 3)
        );
    }

    #[test]
    fn probabilities_are_well_formed() {
        let mut counts = counted(&segments(), 2);
        counts.prune(0);
        let total = counts.num_single() as f64;
        for &c in counts.table(1).unwrap().values() {
            let p = c as f64 / total;
            assert!(p > 0.0 && p <= 1.0);
        }
        for (key, &c) in counts.table(2).unwrap() {
            let first = key.symbols(2)[0];
            let p = c as f64 / counts.unigram(first) as f64;
            assert!(p > 0.0 && p <= 1.0);
        }
    }

    #[test]
    fn dual_mode_keys_are_distinct() {
        let mut counts = NGramCounts::new(2, SymbolMode::Dual);
        counts.count_segment(&[Symbol::new(0, 1), Symbol::new(1, 2)]);
        counts.count_segment(&[Symbol::new(0, 3), Symbol::new(1, 2)]);
        assert_eq!(counts.unigram(Symbol::new(0, 1)), 1);
        assert_eq!(counts.unigram(Symbol::new(0, 3)), 1);
        assert_eq!(counts.unigram(Symbol::new(1, 2)), 2);
        assert_eq!(counts.bigram(Symbol::new(0, 1), Symbol::new(1, 2)), 1);
    }
}
