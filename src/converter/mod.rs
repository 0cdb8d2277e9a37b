//! Pinyin-to-character conversion via lattice construction and Viterbi search.
//!
//! Each input syllable expands to its candidate characters; an order-2 or
//! order-3 max-product search with interpolated probabilities picks the
//! best sequence.

mod lattice;
mod scorer;
pub(crate) mod testutil;
mod viterbi;

#[cfg(test)]
mod tests;

use tracing::debug_span;

use crate::dict::{SyllableTable, Vocabulary};
use crate::ngram::NGramCounts;

pub use lattice::{build_lattice, Lattice};
pub use scorer::Interpolation;
pub use viterbi::Beam;

use scorer::Scorer;

/// Per-line decode failure. The caller reports it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown syllable: {0}")]
    UnknownSyllable(String),

    #[error("syllable has no candidate characters: {0}")]
    EmptyCandidateSet(String),
}

/// Decoder knobs that are not stored in the model file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    pub weights: Interpolation,
    /// `None` searches every predecessor pair at every position.
    pub beam: Option<Beam>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            weights: Interpolation::default(),
            beam: Some(Beam {
                begin_cut: 4,
                top_num: 10,
            }),
        }
    }
}

/// Result of one decode call.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub chars: Vec<char>,
    /// Probability of the chosen path. Exactly 0 means no candidate path
    /// had any support in the model and `chars` is the index-0 fallback.
    pub score: f64,
}

impl Conversion {
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_unmodeled(&self) -> bool {
        self.score == 0.0
    }
}

/// Convert a syllable sequence to the most likely character sequence.
///
/// Any unresolvable syllable fails the whole call; no partial output is
/// produced. Empty input yields an empty conversion.
pub fn convert<S: AsRef<str>>(
    counts: &NGramCounts,
    vocab: &Vocabulary,
    syllables: &SyllableTable,
    config: &DecoderConfig,
    input: &[S],
) -> Result<Conversion, DecodeError> {
    let _span = debug_span!("convert", order = counts.order(), len = input.len()).entered();
    let lattice = build_lattice(syllables, input)?;
    let scorer = Scorer::new(counts, config.weights);
    let path = viterbi::viterbi(&lattice, &scorer, counts.order(), config.beam);

    let chars = path
        .indices
        .iter()
        .zip(&lattice.columns)
        .map(|(&i, column)| {
            vocab
                .char_at(column[i].ch)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();

    Ok(Conversion {
        chars,
        score: path.score,
    })
}
