//! Encoded text units and the packed n-gram key built from them.

use serde::{Deserialize, Serialize};

/// Highest n-gram order a packed key can hold (4 × 32 bits = 128 bits).
pub const MAX_ORDER: usize = 4;

/// Whether symbols carry a syllable index next to the character index.
///
/// Fixed when a model is trained; a model file only decodes correctly
/// under the same mode it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolMode {
    Single,
    Dual,
}

impl SymbolMode {
    pub fn from_dual(dual: bool) -> Self {
        if dual {
            Self::Dual
        } else {
            Self::Single
        }
    }

    pub fn is_dual(self) -> bool {
        self == Self::Dual
    }

    /// Number of u16 fields one symbol occupies on disk.
    pub fn width(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Dual => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Dual => "dual",
        }
    }
}

/// A character index, optionally paired with the syllable it was read as.
///
/// In single mode `syllable` is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    pub ch: u16,
    pub syllable: u16,
}

impl Symbol {
    pub fn new(ch: u16, syllable: u16) -> Self {
        Self { ch, syllable }
    }

    pub fn single(ch: u16) -> Self {
        Self { ch, syllable: 0 }
    }

    fn packed(self) -> u32 {
        (u32::from(self.ch) << 16) | u32::from(self.syllable)
    }

    fn unpacked(bits: u32) -> Self {
        Self {
            ch: (bits >> 16) as u16,
            syllable: bits as u16,
        }
    }
}

/// Fixed-width key for one n-gram window.
///
/// Each symbol takes 32 bits, the first symbol in the most significant
/// occupied slot. Keys are only compared within a single order's table,
/// so windows of different lengths never need to be distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NGramKey(u128);

impl NGramKey {
    pub fn from_symbols(symbols: &[Symbol]) -> Self {
        debug_assert!(symbols.len() <= MAX_ORDER, "n-gram window too long");
        let bits = symbols
            .iter()
            .fold(0u128, |acc, s| (acc << 32) | u128::from(s.packed()));
        Self(bits)
    }

    pub fn unigram(a: Symbol) -> Self {
        Self(u128::from(a.packed()))
    }

    pub fn bigram(a: Symbol, b: Symbol) -> Self {
        Self((u128::from(a.packed()) << 32) | u128::from(b.packed()))
    }

    pub fn trigram(a: Symbol, b: Symbol, c: Symbol) -> Self {
        Self(
            (u128::from(a.packed()) << 64)
                | (u128::from(b.packed()) << 32)
                | u128::from(c.packed()),
        )
    }

    /// Recover the `order` symbols this key was packed from.
    pub fn symbols(self, order: usize) -> Vec<Symbol> {
        (0..order)
            .rev()
            .map(|slot| Symbol::unpacked((self.0 >> (slot * 32)) as u32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_match_generic_packing() {
        let a = Symbol::new(1, 7);
        let b = Symbol::new(2, 8);
        let c = Symbol::new(3, 9);
        assert_eq!(NGramKey::unigram(a), NGramKey::from_symbols(&[a]));
        assert_eq!(NGramKey::bigram(a, b), NGramKey::from_symbols(&[a, b]));
        assert_eq!(
            NGramKey::trigram(a, b, c),
            NGramKey::from_symbols(&[a, b, c])
        );
    }

    #[test]
    fn symbols_are_recovered_in_order() {
        let window = [Symbol::new(40000, 3), Symbol::new(0, 65535), Symbol::single(9)];
        let key = NGramKey::from_symbols(&window);
        assert_eq!(key.symbols(3), window.to_vec());
    }

    #[test]
    fn same_character_different_syllable_does_not_alias() {
        let a = Symbol::new(5, 1);
        let b = Symbol::new(5, 2);
        let next = Symbol::new(6, 0);
        assert_ne!(NGramKey::bigram(a, next), NGramKey::bigram(b, next));
    }

    #[test]
    fn mode_width() {
        assert_eq!(SymbolMode::Single.width(), 1);
        assert_eq!(SymbolMode::Dual.width(), 2);
        assert!(SymbolMode::from_dual(true).is_dual());
    }
}
