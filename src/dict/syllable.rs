use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use super::{strip_bom, DictError, Vocabulary};
use crate::symbol::{Symbol, SymbolMode};

/// Pinyin syllable → candidate symbols, plus a dense syllable index.
///
/// Syllable indices follow the order in which syllables first appear in
/// the reference file. In dual mode every candidate carries the index of
/// the syllable it was listed under.
#[derive(Debug, Clone)]
pub struct SyllableTable {
    mode: SymbolMode,
    names: Vec<String>,
    index: HashMap<String, u16>,
    candidates: Vec<Vec<Symbol>>,
}

impl SyllableTable {
    /// Parse lines of the form `syllable ch1 ch2 ... chK`.
    ///
    /// Blank lines are skipped. A syllable listed twice keeps its first
    /// index and accumulates candidates from both lines.
    pub fn from_text(text: &str, vocab: &Vocabulary, mode: SymbolMode) -> Result<Self, DictError> {
        let mut table = Self {
            mode,
            names: Vec::new(),
            index: HashMap::new(),
            candidates: Vec::new(),
        };

        for (line_no, line) in strip_bom(text).lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(syllable) = fields.next() else {
                continue;
            };
            let syl_idx = table.intern(syllable)?;

            for token in fields {
                let mut chars = token.chars();
                let (Some(ch), None) = (chars.next(), chars.next()) else {
                    return Err(DictError::Parse(format!(
                        "line {}: expected a single character, got '{token}'",
                        line_no + 1
                    )));
                };
                let ch_idx = vocab.index_of(ch).ok_or(DictError::UnknownCharacter {
                    ch,
                    line: line_no + 1,
                })?;
                let symbol = match mode {
                    SymbolMode::Single => Symbol::single(ch_idx),
                    SymbolMode::Dual => Symbol::new(ch_idx, syl_idx),
                };
                let list = &mut table.candidates[syl_idx as usize];
                if !list.contains(&symbol) {
                    list.push(symbol);
                }
            }
        }

        debug!(syllables = table.names.len(), mode = mode.name(), "syllable table loaded");
        Ok(table)
    }

    pub fn open(path: &Path, vocab: &Vocabulary, mode: SymbolMode) -> Result<Self, DictError> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text, vocab, mode)
    }

    fn intern(&mut self, syllable: &str) -> Result<u16, DictError> {
        if let Some(&idx) = self.index.get(syllable) {
            return Ok(idx);
        }
        let idx = u16::try_from(self.names.len())
            .map_err(|_| DictError::TooManySyllables(self.names.len() + 1))?;
        self.index.insert(syllable.to_string(), idx);
        self.names.push(syllable.to_string());
        self.candidates.push(Vec::new());
        Ok(idx)
    }

    /// Candidate symbols for a syllable, in file order.
    pub fn candidates(&self, syllable: &str) -> Option<&[Symbol]> {
        self.index
            .get(syllable)
            .map(|&idx| self.candidates[idx as usize].as_slice())
    }

    pub fn index_of(&self, syllable: &str) -> Option<u16> {
        self.index.get(syllable).copied()
    }

    pub fn name(&self, idx: u16) -> Option<&str> {
        self.names.get(idx as usize).map(String::as_str)
    }

    pub fn mode(&self) -> SymbolMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
