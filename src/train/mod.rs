//! Training: raw text → encoded segments → pruned n-gram tables.

mod preprocess;

pub use preprocess::{normalize_syllable, PhoneticOracle, PinyinOracle, Preprocessor};

use std::io;

use rayon::prelude::*;
use tracing::{info, info_span};

use crate::dict::{SyllableTable, Vocabulary};
use crate::ngram::{count_parallel, NGramCounts};
use crate::symbol::Symbol;

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot resolve pronunciation of '{ch}' (oracle gave {syllable:?})")]
    UnresolvedPronunciation { ch: char, syllable: Option<String> },

    #[error("invalid training configuration: {0}")]
    Config(String),
}

/// Count a whole corpus and prune the higher orders.
///
/// Lines are preprocessed and counted in parallel; the result does not
/// depend on how the work is sharded.
pub fn train_text(
    text: &str,
    vocab: &Vocabulary,
    syllables: &SyllableTable,
    oracle: Option<&dyn PhoneticOracle>,
    order: usize,
    threshold: u32,
) -> Result<NGramCounts, TrainError> {
    let _span = info_span!("train", order, threshold).entered();
    let pre = Preprocessor::new(vocab, syllables, oracle)?;

    let segments: Vec<Vec<Symbol>> = text
        .par_lines()
        .map(|line| pre.segments(line))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect();
    info!(segments = segments.len(), "preprocessed");

    let mut counts = count_parallel(&segments, order, syllables.mode());
    info!(
        num_single = counts.num_single(),
        sizes = ?counts.sizes(),
        "counted"
    );

    let removed = counts.prune(threshold);
    info!(removed, sizes = ?counts.sizes(), "pruned");
    Ok(counts)
}
