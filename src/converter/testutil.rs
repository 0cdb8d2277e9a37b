#![cfg(test)]

use crate::converter::{convert, Conversion, DecodeError, DecoderConfig};
use crate::dict::{SyllableTable, Vocabulary};
use crate::ngram::NGramCounts;
use crate::symbol::{Symbol, SymbolMode};

const VOCAB: &str = "清氰青华化话大打学雪";
const SYLLABLES: &str = "qing 清 氰 青\nhua 华 化 话\nda 大 打\nxue 学 雪\n";

/// Shared reference data plus tables counted from a tiny corpus.
pub struct Fixture {
    pub vocab: Vocabulary,
    pub syllables: SyllableTable,
    pub counts: NGramCounts,
}

impl Fixture {
    /// Count each `(segment, repeat)` pair `repeat` times, no pruning.
    pub fn new(order: usize, corpus: &[(&str, usize)]) -> Self {
        let vocab = Vocabulary::from_text(VOCAB).unwrap();
        let syllables = SyllableTable::from_text(SYLLABLES, &vocab, SymbolMode::Single).unwrap();
        let mut counts = NGramCounts::new(order, SymbolMode::Single);
        for &(segment, repeat) in corpus {
            let symbols: Vec<Symbol> = segment
                .chars()
                .map(|c| Symbol::single(vocab.index_of(c).unwrap()))
                .collect();
            for _ in 0..repeat {
                counts.count_segment(&symbols);
            }
        }
        Self {
            vocab,
            syllables,
            counts,
        }
    }

    pub fn convert(
        &self,
        input: &[&str],
        config: &DecoderConfig,
    ) -> Result<Conversion, DecodeError> {
        convert(&self.counts, &self.vocab, &self.syllables, config, input)
    }

    pub fn text(&self, input: &[&str], config: &DecoderConfig) -> String {
        self.convert(input, config).unwrap().text()
    }
}

/// Decoder settings with the given weights and no beam.
pub fn exhaustive(alpha: f64, beta: f64) -> DecoderConfig {
    DecoderConfig {
        weights: crate::converter::Interpolation { alpha, beta },
        beam: None,
    }
}
