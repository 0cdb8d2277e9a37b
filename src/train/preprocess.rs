use std::borrow::Cow;

use pinyin::ToPinyin;

use super::TrainError;
use crate::dict::{SyllableTable, Vocabulary};
use crate::symbol::{Symbol, SymbolMode};

/// Supplies the pronunciation of each character of a text segment.
///
/// Only consulted when training a dual-mode model.
pub trait PhoneticOracle: Send + Sync {
    /// One entry per `char` of `segment`, `None` where no reading is known.
    fn transcribe(&self, segment: &str) -> Vec<Option<String>>;
}

/// Toneless readings from the `pinyin` crate's character tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct PinyinOracle;

impl PhoneticOracle for PinyinOracle {
    fn transcribe(&self, segment: &str) -> Vec<Option<String>> {
        segment
            .chars()
            .map(|c| c.to_pinyin().map(|p| p.plain().to_string()))
            .collect()
    }
}

/// Oracle spellings that differ from the syllable table's.
const SYLLABLE_FIXUPS: &[(&str, &str)] = &[
    ("n", "en"),
    ("ng", "en"),
    ("m", "mu"),
    ("hm", "hen"),
    ("hng", "heng"),
    ("ê", "ei"),
    ("yo", "you"),
    ("lo", "luo"),
];

/// Map an oracle syllable onto the spelling used by the syllable table.
pub fn normalize_syllable(raw: &str) -> Cow<'_, str> {
    if let Some(&(_, fixed)) = SYLLABLE_FIXUPS.iter().find(|(from, _)| *from == raw) {
        return Cow::Borrowed(fixed);
    }
    if raw.contains('ü') {
        Cow::Owned(raw.replace('ü', "v"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Characters that always end a segment, even if listed in the vocabulary.
fn is_separator(ch: char) -> bool {
    ch.is_ascii()
        || ch.is_whitespace()
        || ch.is_numeric()
        || matches!(ch,
            '\u{2000}'..='\u{206f}'   // general punctuation
            | '\u{3000}'..='\u{303f}' // CJK symbols and punctuation
            | '\u{ff00}'..='\u{ffef}' // full-width forms
        )
}

/// Turns raw training text into index-encoded segments.
///
/// Punctuation, digits, Latin letters and characters outside the
/// vocabulary all act as segment boundaries, so no n-gram ever spans
/// two clauses.
pub struct Preprocessor<'a> {
    vocab: &'a Vocabulary,
    syllables: &'a SyllableTable,
    oracle: Option<&'a dyn PhoneticOracle>,
}

impl<'a> Preprocessor<'a> {
    /// A dual-mode syllable table requires an oracle.
    pub fn new(
        vocab: &'a Vocabulary,
        syllables: &'a SyllableTable,
        oracle: Option<&'a dyn PhoneticOracle>,
    ) -> Result<Self, TrainError> {
        if syllables.mode() == SymbolMode::Dual && oracle.is_none() {
            return Err(TrainError::Config(
                "dual-syllable training needs a phonetic oracle".to_string(),
            ));
        }
        Ok(Self {
            vocab,
            syllables,
            oracle,
        })
    }

    /// Split `text` into runs of vocabulary characters.
    pub fn split<'t>(&self, text: &'t str) -> Vec<&'t str> {
        text.split(|ch: char| is_separator(ch) || !self.vocab.contains(ch))
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Encode every segment of `text`.
    pub fn segments(&self, text: &str) -> Result<Vec<Vec<Symbol>>, TrainError> {
        self.split(text)
            .into_iter()
            .map(|segment| self.encode(segment))
            .collect()
    }

    /// Encode one segment that contains only vocabulary characters.
    pub fn encode(&self, segment: &str) -> Result<Vec<Symbol>, TrainError> {
        let indices = segment.chars().map(|ch| {
            // split() only yields vocabulary characters
            (ch, self.vocab.index_of(ch).unwrap_or_default())
        });

        match (self.syllables.mode(), self.oracle) {
            (SymbolMode::Dual, Some(oracle)) => {
                let readings = oracle.transcribe(segment);
                indices
                    .enumerate()
                    .map(|(i, (ch, ch_idx))| {
                        let raw = readings.get(i).cloned().flatten();
                        let syllable = raw.as_deref().and_then(|r| self.resolve(r));
                        match syllable {
                            Some(syl_idx) => Ok(Symbol::new(ch_idx, syl_idx)),
                            None => Err(TrainError::UnresolvedPronunciation { ch, syllable: raw }),
                        }
                    })
                    .collect()
            }
            _ => Ok(indices.map(|(_, ch_idx)| Symbol::single(ch_idx)).collect()),
        }
    }

    /// Syllable index for an oracle reading. The remap table only applies
    /// when the reading itself is not in the syllable table.
    fn resolve(&self, raw: &str) -> Option<u16> {
        self.syllables
            .index_of(raw)
            .or_else(|| self.syllables.index_of(&normalize_syllable(raw)))
    }
}
