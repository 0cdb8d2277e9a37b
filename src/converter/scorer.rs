use crate::ngram::NGramCounts;
use crate::symbol::Symbol;

/// Linear interpolation weights.
///
/// Order-2 transitions use `alpha·p2 + (1-alpha)·p1`; order-3 transitions
/// use `beta·p3 + alpha·p2 + (1-alpha-beta)·p1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolation {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for Interpolation {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            beta: 0.0,
        }
    }
}

/// Maximum-likelihood estimates read straight from the count tables.
pub(crate) struct Scorer<'a> {
    counts: &'a NGramCounts,
    weights: Interpolation,
}

impl<'a> Scorer<'a> {
    pub fn new(counts: &'a NGramCounts, weights: Interpolation) -> Self {
        Self { counts, weights }
    }

    /// `count1(cur) / numSingle`, 0 when unseen.
    pub fn unigram(&self, cur: Symbol) -> f64 {
        ratio(self.counts.unigram(cur), self.counts.num_single())
    }

    /// Order-2 transition with an explicit weight on the bigram term.
    ///
    /// An unseen `cur` scores 0 regardless of its context.
    pub fn bigram_with(&self, weight: f64, last: Symbol, cur: Symbol) -> f64 {
        let p1 = self.unigram(cur);
        let p2 = if p1 > 0.0 {
            ratio(self.counts.bigram(last, cur), self.counts.unigram(last))
        } else {
            0.0
        };
        weight * p2 + (1.0 - weight) * p1
    }

    pub fn bigram(&self, last: Symbol, cur: Symbol) -> f64 {
        self.bigram_with(self.weights.alpha, last, cur)
    }

    /// Order-3 transition. The trigram term is only consulted when the
    /// bigram `(last1, cur)` was observed.
    pub fn trigram(&self, last2: Symbol, last1: Symbol, cur: Symbol) -> f64 {
        let Interpolation { alpha, beta } = self.weights;
        let p1 = self.unigram(cur);
        let mut p2 = 0.0;
        let mut p3 = 0.0;
        if p1 > 0.0 {
            let c2 = self.counts.bigram(last1, cur);
            if c2 > 0 {
                p2 = ratio(c2, self.counts.unigram(last1));
                p3 = ratio(
                    self.counts.trigram(last2, last1, cur),
                    self.counts.bigram(last2, last1),
                );
            }
        }
        beta * p3 + alpha * p2 + (1.0 - alpha - beta) * p1
    }

    /// Weight on the bigram term when seeding position 1 of an order-3
    /// search, where no trigram context exists yet.
    pub fn seed_weight(&self) -> f64 {
        self.weights.alpha + self.weights.beta
    }
}

fn ratio(num: u32, den: u32) -> f64 {
    if num == 0 || den == 0 {
        0.0
    } else {
        f64::from(num) / f64::from(den)
    }
}
