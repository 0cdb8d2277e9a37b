use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use super::{strip_bom, DictError};

/// The fixed, ordered set of characters the model knows about.
///
/// Index `i` is the position where a character first appeared in the
/// reference text. Immutable once built.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    chars: Vec<char>,
    index: HashMap<char, u16>,
}

impl Vocabulary {
    /// Build from text listing every recognised character.
    ///
    /// Whitespace is ignored; repeated characters keep their first index.
    pub fn from_text(text: &str) -> Result<Self, DictError> {
        let mut chars = Vec::new();
        let mut index = HashMap::new();
        for ch in strip_bom(text).chars() {
            if ch.is_whitespace() || index.contains_key(&ch) {
                continue;
            }
            let idx = u16::try_from(chars.len())
                .map_err(|_| DictError::VocabularyTooLarge(chars.len() + 1))?;
            index.insert(ch, idx);
            chars.push(ch);
        }
        debug!(size = chars.len(), "vocabulary loaded");
        Ok(Self { chars, index })
    }

    pub fn open(path: &Path) -> Result<Self, DictError> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    pub fn index_of(&self, ch: char) -> Option<u16> {
        self.index.get(&ch).copied()
    }

    pub fn char_at(&self, idx: u16) -> Option<char> {
        self.chars.get(idx as usize).copied()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.index.contains_key(&ch)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}
